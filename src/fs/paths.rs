//! Download tree layout.
//!
//! ```text
//! <download-root>/<username>/<username>.json        normalized profile graph
//! <download-root>/<username>/downloads/<board>/     per-board media
//! <download-root>/<username>/downloads/user/        avatar and banner
//! ```

use std::path::{Path, PathBuf};

use crate::fs::naming::sanitize;
use crate::model::Board;

/// Directory under `downloads/` holding profile assets.
const PROFILE_ASSETS_DIR: &str = "user";

/// All paths for one scraped profile.
#[derive(Debug, Clone)]
pub struct ProfilePaths {
    user_dir: PathBuf,
    username: String,
}

impl ProfilePaths {
    pub fn new(download_root: &Path, username: &str) -> Self {
        let safe = sanitize(username);
        Self {
            user_dir: download_root.join(&safe),
            username: safe,
        }
    }

    pub fn user_dir(&self) -> &Path {
        &self.user_dir
    }

    /// Where the normalized graph JSON is persisted.
    pub fn graph_file(&self) -> PathBuf {
        self.user_dir.join(format!("{}.json", self.username))
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.user_dir.join("downloads")
    }

    pub fn board_dir(&self, board: &Board) -> PathBuf {
        self.downloads_dir().join(sanitize(&board.title_or_id()))
    }

    pub fn profile_assets_dir(&self) -> PathBuf {
        self.downloads_dir().join(PROFILE_ASSETS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(name: &str) -> Board {
        Board {
            id: 7,
            name: name.to_string(),
            url: String::new(),
            pin_count: 0,
            follower_count: 0,
            cover_url: None,
            created_at: None,
            pins: Vec::new(),
        }
    }

    #[test]
    fn test_layout() {
        let paths = ProfilePaths::new(Path::new("/dl"), "someuser");
        assert_eq!(paths.graph_file(), PathBuf::from("/dl/someuser/someuser.json"));
        assert_eq!(paths.downloads_dir(), PathBuf::from("/dl/someuser/downloads"));
        assert_eq!(
            paths.profile_assets_dir(),
            PathBuf::from("/dl/someuser/downloads/user")
        );
    }

    #[test]
    fn test_board_dir_is_sanitized() {
        let paths = ProfilePaths::new(Path::new("/dl"), "someuser");
        assert_eq!(
            paths.board_dir(&board("Travel: Japan/2024")),
            PathBuf::from("/dl/someuser/downloads/Travel_ Japan_2024")
        );
    }

    #[test]
    fn test_unnamed_board_uses_id() {
        let paths = ProfilePaths::new(Path::new("/dl"), "someuser");
        assert_eq!(
            paths.board_dir(&board("")),
            PathBuf::from("/dl/someuser/downloads/7")
        );
    }
}
