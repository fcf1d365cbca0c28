//! Parsing of `distrobox list` and `distrobox create --compatibility`

use serde::{Deserialize, Serialize};

/// An existing container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub status: String,
    pub image: String,
}

/// One base-image choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableImage {
    pub name: String,
    pub image: String,
}

/// Display names and full image references, kept the same length
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableImages {
    display_names: Vec<String>,
    full_names: Vec<String>,
}

impl AvailableImages {
    pub fn push(&mut self, display_name: String, full_name: String) {
        self.display_names.push(display_name);
        self.full_names.push(full_name);
    }

    pub fn is_empty(&self) -> bool {
        self.full_names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.full_names.len()
    }

    pub fn display_names(&self) -> &[String] {
        &self.display_names
    }

    pub fn full_names(&self) -> &[String] {
        &self.full_names
    }

    pub fn to_vec(&self) -> Vec<AvailableImage> {
        self.display_names
            .iter()
            .zip(&self.full_names)
            .map(|(name, image)| AvailableImage {
                name: name.clone(),
                image: image.clone(),
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_vec())
    }
}

/// Parse the `ID | NAME | STATUS | IMAGE` table printed by `distrobox list`
pub fn parse_container_list(output: &str) -> Vec<Container> {
    output
        .lines()
        .filter_map(|line| {
            let cells: Vec<&str> = line.split('|').map(str::trim).collect();
            if cells.len() < 4 || cells[0].eq_ignore_ascii_case("id") || cells[1].is_empty() {
                return None;
            }
            Some(Container {
                name: cells[1].to_string(),
                status: cells[2].to_string(),
                image: cells[3].to_string(),
            })
        })
        .collect()
}

pub fn containers_to_json(containers: &[Container]) -> Result<String, serde_json::Error> {
    serde_json::to_string(containers)
}

/// Parse the image references printed by `distrobox create --compatibility`
pub fn parse_compatible_images(output: &str) -> AvailableImages {
    let mut images = AvailableImages::default();

    for line in output.lines().map(str::trim) {
        if line.is_empty() || line.contains(char::is_whitespace) {
            continue;
        }
        if !line.contains('/') && !line.contains(':') {
            continue;
        }
        if images.full_names().iter().any(|known| known == line) {
            continue;
        }
        images.push(image_display_name(line).to_string(), line.to_string());
    }

    images
}

/// `quay.io/toolbx/ubuntu-toolbox:22.04` -> `ubuntu-toolbox:22.04`
pub fn image_display_name(image: &str) -> &str {
    image.rsplit('/').next().unwrap_or(image)
}
