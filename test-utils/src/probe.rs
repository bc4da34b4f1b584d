use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use vmstrap::HostProbe;
use vmstrap_shared::constants::environment;

/// An in-memory host.
#[derive(Debug, Clone)]
pub struct FakeProbe {
    uid: u32,
    existing: HashSet<PathBuf>,
    files: HashMap<PathBuf, String>,
}

impl FakeProbe {
    /// Root on the live ISO, booted in UEFI mode, inside VMware.
    pub fn approved() -> Self {
        let mut files = HashMap::new();
        files.insert(
            PathBuf::from(environment::PRODUCT_NAME_PATH),
            "VMware Virtual Platform\n".to_string(),
        );
        Self {
            uid: 0,
            existing: [environment::LIVE_MARKER, environment::EFI_DIR]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            files,
        }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = uid;
        self
    }

    pub fn without_path(mut self, path: &str) -> Self {
        self.existing.remove(Path::new(path));
        self
    }

    /// `None` makes the product name unreadable.
    pub fn with_product_name(mut self, name: Option<&str>) -> Self {
        let path = PathBuf::from(environment::PRODUCT_NAME_PATH);
        match name {
            Some(name) => {
                self.files.insert(path, name.to_string());
            }
            None => {
                self.files.remove(&path);
            }
        }
        self
    }
}

impl HostProbe for FakeProbe {
    fn effective_uid(&self) -> u32 {
        self.uid
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.existing.contains(path) || self.files.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}
