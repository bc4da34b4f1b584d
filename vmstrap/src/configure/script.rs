//! Synthesis of the first-boot control script.
//!
//! The script is plain bash run once inside the new root. It is rendered
//! from an ordered list of [`ScriptStep`]s; `set -euo pipefail` makes the
//! first failing step abort the whole script.

use super::identity::{IdentityConfig, Secret};
use crate::options::SystemSettings;
use std::fmt;

const SHEBANG: &str = "#!/bin/bash";
const STRICT_MODE: &str = "set -euo pipefail";

/// One titled group of shell lines.
#[derive(Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub title: String,
    pub lines: Vec<String>,
}

impl ScriptStep {
    fn new(title: &str, lines: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            lines,
        }
    }
}

// Lines may carry passwords.
impl fmt::Debug for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptStep")
            .field("title", &self.title)
            .field("lines", &self.lines.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlScript {
    steps: Vec<ScriptStep>,
}

impl ControlScript {
    /// Build the configuration script for `identity` under `settings`.
    pub fn for_identity(identity: &IdentityConfig, settings: &SystemSettings) -> Self {
        Self {
            steps: vec![
                hostname_step(&identity.hostname),
                timezone_step(&settings.timezone),
                locale_step(&settings.locale),
                root_password_step(&identity.root_password),
                user_step(identity, settings),
                sudoers_step(&settings.admin_group),
                ScriptStep::new("Installing systemd-boot", vec!["bootctl install".to_string()]),
                boot_entry_step(settings),
            ],
        }
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Render the full script text.
    pub fn render(&self) -> String {
        let mut out = format!("{SHEBANG}\n{STRICT_MODE}\n");
        for step in &self.steps {
            out.push('\n');
            out.push_str(&format!("# {}\n", step.title));
            out.push_str(&format!("echo {}\n", shell_quote(&format!("==> {}", step.title))));
            for line in &step.lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// Quote `word` for bash. Words made only of safe characters pass through.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if safe {
        word.to_string()
    } else {
        single_quote(word)
    }
}

/// Always single-quote, escaping embedded quotes as `'\''`.
fn single_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// `printf` each line into `target`, one argument per line.
fn write_lines(target: &str, lines: &[String]) -> Vec<String> {
    let mut out = vec!["printf '%s\\n' \\".to_string()];
    for line in lines {
        out.push(format!("    {} \\", single_quote(line)));
    }
    out.push(format!("    > {target}"));
    out
}

fn chpasswd_line(user: &str, password: &Secret) -> String {
    format!(
        "printf '%s\\n' {} | chpasswd",
        single_quote(&format!("{user}:{}", password.expose()))
    )
}

fn hostname_step(hostname: &str) -> ScriptStep {
    let mut lines = vec![format!("echo {hostname} > /etc/hostname")];
    lines.extend(write_lines(
        "/etc/hosts",
        &[
            "127.0.0.1   localhost".to_string(),
            "::1         localhost".to_string(),
            format!("127.0.1.1   {hostname}.localdomain {hostname}"),
        ],
    ));
    ScriptStep::new("Setting hostname", lines)
}

fn timezone_step(timezone: &str) -> ScriptStep {
    ScriptStep::new(
        "Setting timezone",
        vec![
            format!(
                "ln -sf {} /etc/localtime",
                shell_quote(&format!("/usr/share/zoneinfo/{timezone}"))
            ),
            "hwclock --systohc".to_string(),
        ],
    )
}

fn locale_step(locale: &str) -> ScriptStep {
    let charset = locale.split_once('.').map_or("UTF-8", |(_, cs)| cs);
    let entry = format!("{locale} {charset}");
    ScriptStep::new(
        "Generating locale",
        vec![
            format!(
                "sed -i {} /etc/locale.gen",
                single_quote(&format!("s/^#{entry}/{entry}/"))
            ),
            "locale-gen".to_string(),
            format!("echo {} > /etc/locale.conf", shell_quote(&format!("LANG={locale}"))),
        ],
    )
}

fn root_password_step(password: &Secret) -> ScriptStep {
    ScriptStep::new("Setting root password", vec![chpasswd_line("root", password)])
}

fn user_step(identity: &IdentityConfig, settings: &SystemSettings) -> ScriptStep {
    ScriptStep::new(
        "Creating user",
        vec![
            format!(
                "useradd -m -G {} -s {} {}",
                shell_quote(&settings.admin_group),
                shell_quote(&settings.shell),
                identity.username
            ),
            chpasswd_line(&identity.username, &identity.user_password),
        ],
    )
}

fn sudoers_step(group: &str) -> ScriptStep {
    let rule = format!("%{group} ALL=(ALL) ALL");
    ScriptStep::new(
        "Granting sudo",
        vec![format!(
            "sed -i {} /etc/sudoers",
            single_quote(&format!("s/^# {rule}/{rule}/"))
        )],
    )
}

/// Loader config plus one entry. Kernel, initramfs and the root PARTUUID
/// are only known inside the new root, so they are resolved at run time.
fn boot_entry_step(settings: &SystemSettings) -> ScriptStep {
    let entry = &settings.loader_entry;
    let mut lines = vec!["mkdir -p /boot/loader/entries".to_string()];
    lines.extend(write_lines(
        "/boot/loader/loader.conf",
        &[
            format!("default  {entry}"),
            format!("timeout  {}", settings.loader_timeout),
            "editor   no".to_string(),
        ],
    ));
    lines.extend([
        "KERNEL_IMG=$(ls /boot/vmlinuz-linux* 2>/dev/null | head -n 1 || true)".to_string(),
        "INITRAMFS_IMG=$(ls /boot/initramfs-linux* 2>/dev/null | head -n 1 || true)".to_string(),
        "if [ -z \"$KERNEL_IMG\" ] || [ -z \"$INITRAMFS_IMG\" ]; then".to_string(),
        "    echo 'Kernel or initramfs image not found in /boot' >&2".to_string(),
        "    exit 1".to_string(),
        "fi".to_string(),
        "ROOT_PART=$(findmnt -n -o SOURCE /)".to_string(),
        "PARTUUID=$(blkid -s PARTUUID -o value \"$ROOT_PART\")".to_string(),
        "if [ -z \"$PARTUUID\" ]; then".to_string(),
        "    echo \"No PARTUUID for $ROOT_PART\" >&2".to_string(),
        "    exit 1".to_string(),
        "fi".to_string(),
        "printf '%s\\n' \\".to_string(),
        format!("    {} \\", single_quote(&format!("title   {}", settings.entry_title))),
        "    \"linux   ${KERNEL_IMG#/boot}\" \\".to_string(),
        "    \"initrd  ${INITRAMFS_IMG#/boot}\" \\".to_string(),
        "    \"options root=PARTUUID=${PARTUUID} rw\" \\".to_string(),
        format!("    > {}", shell_quote(&format!("/boot/loader/entries/{entry}.conf"))),
    ]);
    ScriptStep::new("Configuring boot loader", lines)
}
