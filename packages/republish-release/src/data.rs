use serde::{Deserialize, Serialize};

/// The subset of a GitHub release object the publisher reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub browser_download_url: Option<String>,
}

impl Release {
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn find_asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    pub fn has_asset(&self, name: &str) -> bool {
        self.find_asset(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_github_release() {
        let json = r#"{
            "id": 40154392,
            "tag_name": "msys2-gcc-pkgs",
            "name": "MSYS2 gcc packages",
            "body": null,
            "assets": [
                {
                    "id": 11,
                    "name": "ucrt64.7z",
                    "size": 1024,
                    "state": "uploaded",
                    "content_type": "application/x-7z-compressed",
                    "browser_download_url": "https://github.com/o/r/releases/download/msys2-gcc-pkgs/ucrt64.7z"
                },
                { "id": 12, "name": "mingw64.7z" }
            ]
        }"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.id, 40154392);
        assert_eq!(release.body_text(), "");
        assert_eq!(release.assets.len(), 2);
        assert_eq!(release.find_asset("ucrt64.7z").map(|a| a.id), Some(11));
        assert_eq!(release.assets[1].size, 0);
        assert!(!release.has_asset("mingw32.7z"));
    }
}
