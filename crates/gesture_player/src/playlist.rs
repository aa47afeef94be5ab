//! 播放列表：扫描音乐目录

use std::io;
use std::path::{Path, PathBuf};

/// 默认支持的扩展名
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["mp3", "wav", "ogg"];

/// 有序曲目列表，顺序即目录遍历顺序（不排序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<PathBuf>,
}

impl Playlist {
    pub fn new(tracks: Vec<PathBuf>) -> Self {
        Self { tracks }
    }

    /// 扫描目录下扩展名匹配的文件；目录不存在时返回空列表
    pub fn scan<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> io::Result<Self> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("music directory {} does not exist", dir.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e),
        };

        let mut tracks = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let path = entry.path();
            if has_extension(&path, extensions) {
                tracks.push(path);
            }
        }

        log::info!("loaded {} track(s) from {}", tracks.len(), dir.display());
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.tracks.get(index).map(PathBuf::as_path)
    }

    pub fn tracks(&self) -> &[PathBuf] {
        &self.tracks
    }

    /// 曲目显示名（文件名）
    pub fn display_name(&self, index: usize) -> Option<String> {
        self.get(index).map(display_name)
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 扩展名匹配，大小写不敏感，允许带前导点
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp3", "b.WAV", "c.ogg", "d.flac", "notes.txt", "noext"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.mp3")).unwrap();

        let playlist = Playlist::scan(dir.path(), &DEFAULT_EXTENSIONS).unwrap();
        let mut names: Vec<_> = (0..playlist.len())
            .filter_map(|i| playlist.display_name(i))
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.mp3", "b.WAV", "c.ogg"]);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let playlist = Playlist::scan(&dir.path().join("missing"), &DEFAULT_EXTENSIONS).unwrap();
        assert!(playlist.is_empty());
    }

    #[test]
    fn test_extension_with_leading_dot() {
        assert!(has_extension(Path::new("x/song.Mp3"), &[".mp3"]));
        assert!(!has_extension(Path::new("x/song.mp3.bak"), &[".mp3"]));
    }
}
