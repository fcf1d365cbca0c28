//! Package-manager command for installing a local package file

use shell_words::quote;

/// Image name fragments and the install command used for that family
const FAMILIES: &[(&[&str], &str)] = &[
    (
        &["ubuntu", "debian", "mint", "kali", "pop-os", "elementary", "deepin", "vanilla"],
        "sudo apt install -y",
    ),
    (
        &["fedora", "rhel", "centos", "alma", "rocky", "ubi", "amazonlinux", "oraclelinux"],
        "sudo dnf install -y",
    ),
    (
        &["opensuse", "suse", "tumbleweed", "leap"],
        "sudo zypper --non-interactive install --allow-unsigned-rpm",
    ),
    (
        &["arch", "manjaro", "steamos", "cachyos", "endeavouros"],
        "sudo pacman -U --noconfirm",
    ),
    (&["alpine", "wolfi", "chainguard"], "sudo apk add --allow-untrusted"),
];

/// Strip a leading `file://` from a dropped package URL
pub fn local_package_path(package: &str) -> &str {
    package.strip_prefix("file://").unwrap_or(package)
}

/// Install command for `package_path` in a container built from `image`,
/// or `None` for a distribution without a known package manager
pub fn install_command(image: &str, package_path: &str) -> Option<String> {
    let image = image.to_ascii_lowercase();
    let name = image.rsplit('/').next().unwrap_or(&image);

    FAMILIES
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| name.contains(m)))
        .map(|(_, install)| format!("{} {}", install, quote(package_path)))
}
