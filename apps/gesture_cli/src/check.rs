//! `check` 子命令：逐个尝试打开音乐目录中的音频文件

use std::path::{Path, PathBuf};

use gesture_player::{display_name, has_extension, probe};

/// 检查时识别的扩展名
pub const CHECK_EXTENSIONS: [&str; 5] = ["mp3", "wav", "ogg", "flac", "m4a"];

#[derive(thiserror::Error, Debug)]
pub enum CheckError {
    #[error("Music directory {0} does not exist")]
    MissingDir(PathBuf),
    #[error("No audio files in {0}")]
    NoAudio(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub error: Option<String>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub files: Vec<FileReport>,
}

impl CheckReport {
    pub fn ok_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.files.len() - self.ok_count()
    }

    pub fn print(&self) {
        for file in &self.files {
            match &file.error {
                None => println!("OK     {}", file.name),
                Some(e) => println!("ERROR  {}: {}", file.name, e),
            }
        }
        println!(
            "{} file(s): {} ok, {} failed",
            self.files.len(),
            self.ok_count(),
            self.failed_count()
        );
    }
}

pub fn check_dir(dir: &Path) -> Result<CheckReport, CheckError> {
    if !dir.is_dir() {
        return Err(CheckError::MissingDir(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, &CHECK_EXTENSIONS) {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(CheckError::NoAudio(dir.to_path_buf()));
    }
    paths.sort();

    let files = paths
        .iter()
        .map(|path| FileReport {
            name: display_name(path),
            error: probe(path).err().map(|e| e.to_string()),
        })
        .collect();
    Ok(CheckReport { files })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0.1 秒的 16bit 单声道静音 WAV
    fn silent_wav() -> Vec<u8> {
        let samples = 800u32;
        let data_len = samples * 2;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&8000u32.to_le_bytes());
        out.extend_from_slice(&16000u32.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(out.len() + data_len as usize, 0);
        out
    }

    #[test]
    fn test_check_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.wav"), silent_wav()).unwrap();
        std::fs::write(dir.path().join("bad.mp3"), b"definitely not audio").unwrap();
        std::fs::write(dir.path().join("cover.jpg"), b"x").unwrap();

        let report = check_dir(dir.path()).unwrap();
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].name, "bad.mp3");
        assert!(!report.files[0].is_ok());
        assert_eq!(report.files[1].name, "good.wav");
        assert!(report.files[1].is_ok());
        assert_eq!(report.ok_count(), 1);
        assert_eq!(report.failed_count(), 1);
    }

    #[test]
    fn test_check_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            check_dir(&dir.path().join("nope")),
            Err(CheckError::MissingDir(_))
        ));
    }

    #[test]
    fn test_check_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        assert!(matches!(check_dir(dir.path()), Err(CheckError::NoAudio(_))));
    }
}
