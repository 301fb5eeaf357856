use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};

/// name of the data directory under the working tree
pub const DATA_DIR: &str = ".ugit";

/// a ugit repository: a working tree with a `.ugit` data directory
///
/// every operation takes the repository it acts on explicitly; peer
/// exchange simply opens a second `Repository` for the other side.
pub struct Repository {
    work_dir: PathBuf,
    git_dir: PathBuf,
    config: Config,
}

impl Repository {
    /// initialize a new repository at the given path
    ///
    /// the path must not exist yet, or must be an empty directory.
    pub fn init(path: &Path) -> Result<Self> {
        if path.exists() {
            let mut entries = fs::read_dir(path).with_path(path)?;
            if entries.next().is_some() {
                return Err(Error::AlreadyExists(path.to_path_buf()));
            }
        }

        let git_dir = path.join(DATA_DIR);

        // create directory skeleton
        fs::create_dir_all(git_dir.join("objects")).with_path(&git_dir)?;
        fs::create_dir_all(git_dir.join("refs/heads")).with_path(&git_dir)?;
        fs::create_dir_all(git_dir.join("refs/tags")).with_path(&git_dir)?;
        fs::create_dir_all(git_dir.join("tmp")).with_path(&git_dir)?;

        // HEAD starts as a symbolic ref to the default branch
        fs::write(git_dir.join("HEAD"), "ref: refs/heads/master\n").with_path(&git_dir)?;

        let config = Config::default();
        config.save(&git_dir.join("config"))?;

        Ok(Self {
            work_dir: path.to_path_buf(),
            git_dir,
            config,
        })
    }

    /// open an existing repository whose working tree is at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let git_dir = path.join(DATA_DIR);
        let config_path = git_dir.join("config");
        if !config_path.is_file() {
            return Err(Error::NotARepository(path.to_path_buf()));
        }

        let config = Config::load(&config_path)?;

        Ok(Self {
            work_dir: path.to_path_buf(),
            git_dir,
            config,
        })
    }

    /// find the repository containing `path`, walking upward
    pub fn discover(path: &Path) -> Result<Self> {
        let start = path
            .canonicalize()
            .with_path(path)?;

        let mut current = start.as_path();
        loop {
            if current.join(DATA_DIR).is_dir() {
                return Self::open(current);
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return Err(Error::NotARepository(start.clone())),
            }
        }
    }

    /// working tree root
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// data directory (`.ugit`)
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// repository configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// path to the objects directory
    pub fn objects_path(&self) -> PathBuf {
        self.git_dir.join("objects")
    }

    /// path to the index file
    pub fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }

    /// path to the config file
    pub fn config_path(&self) -> PathBuf {
        self.git_dir.join("config")
    }

    /// path to the tmp directory (for atomic writes)
    pub fn tmp_path(&self) -> PathBuf {
        self.git_dir.join("tmp")
    }
}
