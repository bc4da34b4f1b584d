//! fstab generation for the freshly mounted disk.
//!
//! Output mirrors what `genfstab -U` writes: a `# <device>` comment above
//! each line and `UUID=` sources.

use crate::disk::{Mount, MountSet};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use vmstrap_shared::{VmstrapError, VmstrapResult};

const ROOT_OPTIONS: &str = "rw,relatime";
const ESP_OPTIONS: &str = "rw,relatime,fmask=0022,dmask=0022,codepage=437,iocharset=ascii,shortname=mixed,utf8,errors=remount-ro";

/// One line of `/etc/fstab`.
///
/// `SPEC TARGET FSTYPE OPTIONS DUMP PASS`
///
/// Examples:
///   - UUID=0a3c... / ext4 rw,relatime 0 1
///   - UUID=6C1A-2F0B /boot vfat rw,relatime 0 2
///   - UUID=9e2f... none swap defaults 0 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstabEntry {
    pub spec: String,
    pub target: String,
    pub filesystem: String,
    pub options: String,
    pub dump: u32,
    pub pass: u32,
}

impl FstabEntry {
    pub fn new_uuid_src(uuid: &str, target: &str, filesystem: &str) -> Self {
        Self {
            spec: format!("UUID={uuid}"),
            target: target.to_string(),
            filesystem: filesystem.to_string(),
            options: "defaults".to_string(),
            dump: 0,
            pass: 0,
        }
    }

    pub fn with_options(mut self, options: &str) -> Self {
        self.options = options.to_string();
        self
    }

    pub fn with_pass(mut self, pass: u32) -> Self {
        self.pass = pass;
        self
    }

    pub fn source_uuid(&self) -> Option<&str> {
        let (kind, rest) = self.spec.split_once('=')?;
        kind.eq_ignore_ascii_case("uuid").then_some(rest)
    }

    /// `(source, mount point, filesystem type)`.
    pub fn triple(&self) -> (&str, &str, &str) {
        (&self.spec, &self.target, &self.filesystem)
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{} {}",
            self.spec, self.target, self.filesystem, self.options, self.dump, self.pass
        )
    }
}

impl fmt::Display for FstabEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

impl FromStr for FstabEntry {
    type Err = VmstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_ascii_whitespace().fuse();
        let spec = parts
            .next()
            .ok_or_else(|| VmstrapError::InvalidArgument("Invalid empty fstab line".into()))?;
        let target = parts.next().ok_or_else(|| {
            VmstrapError::InvalidArgument(format!("Missing target in fstab line '{s}'"))
        })?;
        let filesystem = parts.next().unwrap_or("auto");
        let options = parts.next().unwrap_or("defaults");
        let dump = parse_number(parts.next(), "dump", s)?;
        let pass = parse_number(parts.next(), "pass", s)?;

        Ok(Self {
            spec: spec.to_string(),
            target: target.to_string(),
            filesystem: filesystem.to_string(),
            options: options.to_string(),
            dump,
            pass,
        })
    }
}

fn parse_number(field: Option<&str>, name: &str, line: &str) -> VmstrapResult<u32> {
    match field {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| {
            VmstrapError::InvalidArgument(format!("Invalid {name} field '{value}' in fstab line '{line}'"))
        }),
    }
}

/// Parse fstab text, skipping comments and blank lines.
pub fn parse_fstab(text: &str) -> VmstrapResult<Vec<FstabEntry>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::parse::<FstabEntry>)
        .collect()
}

/// Build the fstab entries for a provisioned disk, root first.
///
/// `uuid_of` resolves the filesystem UUID of a partition device.
pub fn generate_entries<F>(mounts: &MountSet, mut uuid_of: F) -> VmstrapResult<Vec<(PathBuf, FstabEntry)>>
where
    F: FnMut(&Path) -> VmstrapResult<String>,
{
    let root_uuid = uuid_of(&mounts.root.device)?;
    let esp_uuid = uuid_of(&mounts.efi.device)?;
    let swap_uuid = uuid_of(&mounts.swap)?;

    Ok(vec![
        (
            mounts.root.device.clone(),
            FstabEntry::new_uuid_src(&root_uuid, "/", mounts.root.filesystem.mount_type())
                .with_options(ROOT_OPTIONS)
                .with_pass(1),
        ),
        (
            mounts.efi.device.clone(),
            FstabEntry::new_uuid_src(
                &esp_uuid,
                &target_in_root(&mounts.efi, mounts.root_dir()),
                mounts.efi.filesystem.mount_type(),
            )
            .with_options(ESP_OPTIONS)
            .with_pass(2),
        ),
        (
            mounts.swap.clone(),
            FstabEntry::new_uuid_src(&swap_uuid, "none", "swap"),
        ),
    ])
}

/// Mount point of `mount` as seen from inside the new root.
fn target_in_root(mount: &Mount, root: &Path) -> String {
    match mount.target.strip_prefix(root) {
        Ok(rel) => format!("/{}", rel.display()),
        Err(_) => mount.target.display().to_string(),
    }
}

/// Render entries as a genfstab-style block.
pub fn render_block(entries: &[(PathBuf, FstabEntry)]) -> String {
    let mut out = String::new();
    for (device, entry) in entries {
        out.push_str(&format!("# {}\n{}\n\n", device.display(), entry.to_line()));
    }
    out
}

/// Append `block` to `<root>/etc/fstab`, creating `etc/` if needed.
pub fn append_fstab(root: &Path, block: &str) -> VmstrapResult<PathBuf> {
    let etc = root.join("etc");
    fs::create_dir_all(&etc).map_err(|e| {
        VmstrapError::Storage(format!("Failed to create {}: {}", etc.display(), e))
    })?;

    let path = etc.join("fstab");
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| VmstrapError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    file.write_all(block.as_bytes())
        .map_err(|e| VmstrapError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::Filesystem;
    use tempfile::TempDir;

    fn mounts(root: &Path) -> MountSet {
        MountSet {
            root: Mount {
                device: PathBuf::from("/dev/sda3"),
                target: root.to_path_buf(),
                filesystem: Filesystem::Ext4,
            },
            efi: Mount {
                device: PathBuf::from("/dev/sda1"),
                target: root.join("boot"),
                filesystem: Filesystem::Fat32,
            },
            swap: PathBuf::from("/dev/sda2"),
        }
    }

    fn fake_uuid(device: &Path) -> VmstrapResult<String> {
        Ok(match device.to_str() {
            Some("/dev/sda1") => "6C1A-2F0B".to_string(),
            Some("/dev/sda2") => "9e2f7c1d-swap".to_string(),
            Some("/dev/sda3") => "0a3c55e2-root".to_string(),
            _ => return Err(VmstrapError::Internal(format!("unexpected {}", device.display()))),
        })
    }

    #[test]
    fn test_block_round_trips_to_triples() {
        let entries = generate_entries(&mounts(Path::new("/mnt")), fake_uuid).unwrap();
        let block = render_block(&entries);
        let parsed = parse_fstab(&block).unwrap();

        let triples: Vec<_> = parsed.iter().map(FstabEntry::triple).collect();
        assert_eq!(
            triples,
            vec![
                ("UUID=0a3c55e2-root", "/", "ext4"),
                ("UUID=6C1A-2F0B", "/boot", "vfat"),
                ("UUID=9e2f7c1d-swap", "none", "swap"),
            ]
        );
        assert_eq!(parsed, entries.into_iter().map(|(_, e)| e).collect::<Vec<_>>());
    }

    #[test]
    fn test_block_has_device_comments_and_pass_numbers() {
        let entries = generate_entries(&mounts(Path::new("/mnt")), fake_uuid).unwrap();
        let block = render_block(&entries);

        assert!(block.starts_with("# /dev/sda3\nUUID=0a3c55e2-root\t/\text4\trw,relatime\t0 1\n"));
        assert!(block.contains("# /dev/sda1\n"));
        assert!(block.contains("UUID=9e2f7c1d-swap\tnone\tswap\tdefaults\t0 0\n"));
        assert_eq!(entries[1].1.pass, 2);
    }

    #[test]
    fn test_uuid_failure_propagates() {
        let err = generate_entries(&mounts(Path::new("/mnt")), |_| {
            Err(VmstrapError::Storage("no uuid".into()))
        })
        .unwrap_err();
        assert!(err.to_string().contains("no uuid"));
    }

    #[test]
    fn test_parse_minimal_and_invalid_lines() {
        let entry: FstabEntry = "/dev/vda3 /boot".parse().unwrap();
        assert_eq!(entry.triple(), ("/dev/vda3", "/boot", "auto"));
        assert_eq!(entry.options, "defaults");
        assert!(entry.source_uuid().is_none());

        assert!("/dev/vda3".parse::<FstabEntry>().is_err());
        assert!("UUID=x / ext4 defaults zero 1".parse::<FstabEntry>().is_err());
        assert_eq!(
            "uuid=abc / ext4".parse::<FstabEntry>().unwrap().source_uuid(),
            Some("abc")
        );
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("etc")).unwrap();
        std::fs::write(dir.path().join("etc/fstab"), "# Static information\n").unwrap();

        let path = append_fstab(dir.path(), "# /dev/sda3\nUUID=a / ext4 rw 0 1\n").unwrap();
        append_fstab(dir.path(), "# again\n").unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "# Static information\n# /dev/sda3\nUUID=a / ext4 rw 0 1\n# again\n"
        );
    }

    #[test]
    fn test_append_creates_etc() {
        let dir = TempDir::new().unwrap();
        let path = append_fstab(dir.path(), "x\n").unwrap();
        assert_eq!(path, dir.path().join("etc/fstab"));
    }
}
