//! Integration tests for the install pipeline.
//!
//! Every seam is faked: the host, the artifact store, external commands
//! and the operator. The new root is a temp directory.
//!
//! Test categories:
//! - Gating: nothing happens unless every safety predicate holds
//! - Ordering: artifact problems stop the run before the disk is touched
//! - Full run: all stages, fstab and transient script handling

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vmstrap::{
    InstallContext, InstallOptions, InstallPipeline, InstallReport, SafetyCheckResult, StageKind,
    VmstrapError, VmstrapResult,
};
use vmstrap_shared::constants::environment;
use vmstrap_test_utils::{
    FakeProbe, RecordingRunner, ScriptedPrompter, StaticArtifactSource, rootfs_tar_zst,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

struct TestContext {
    probe: FakeProbe,
    source: StaticArtifactSource,
    runner: RecordingRunner,
    prompter: ScriptedPrompter,
    options: InstallOptions,
    _temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("mnt");
        std::fs::create_dir(&root).expect("Failed to create mount root");

        let options = InstallOptions {
            mount_root: root,
            work_dir: temp_dir.path().join("work"),
            ..InstallOptions::default()
        };

        Self {
            probe: FakeProbe::approved(),
            source: StaticArtifactSource::new(rootfs_tar_zst(&[
                ("etc/os-release", "NAME=\"Arch Linux\"\n"),
                ("boot/vmlinuz-linux", "kernel"),
                ("boot/initramfs-linux.img", "initramfs"),
            ])),
            runner: RecordingRunner::new().fake_blkid(),
            prompter: ScriptedPrompter::identity("vmhost", "alice", "pw", "rootpw"),
            options,
            _temp_dir: temp_dir,
        }
    }

    fn with_probe(mut self, probe: FakeProbe) -> Self {
        self.probe = probe;
        self
    }

    fn with_source(mut self, source: StaticArtifactSource) -> Self {
        self.source = source;
        self
    }

    fn with_runner(mut self, runner: RecordingRunner) -> Self {
        self.runner = runner;
        self
    }

    fn pipeline(&self) -> InstallPipeline<'_> {
        InstallPipeline::new(InstallContext {
            probe: &self.probe,
            source: &self.source,
            runner: &self.runner,
            prompter: &self.prompter,
            options: &self.options,
        })
    }

    fn run(&self) -> VmstrapResult<InstallReport> {
        self.pipeline().run()
    }

    fn root(&self) -> &Path {
        &self.options.mount_root
    }

    fn script_on_host(&self) -> PathBuf {
        self.root().join("root/vmstrap-configure.sh")
    }

    fn assert_untouched(&self) {
        assert!(self.runner.is_empty(), "ran {:?}", self.runner.command_lines());
        assert!(self.prompter.asked().is_empty());
    }
}

// ============================================================================
// GATING
// ============================================================================

#[test]
fn each_failed_predicate_blocks_everything() {
    let probes = [
        ("root", FakeProbe::approved().with_uid(1000)),
        ("live", FakeProbe::approved().without_path(environment::LIVE_MARKER)),
        ("uefi", FakeProbe::approved().without_path(environment::EFI_DIR)),
        ("platform", FakeProbe::approved().with_product_name(Some("QEMU Standard PC"))),
        ("unreadable", FakeProbe::approved().with_product_name(None)),
    ];

    for (label, probe) in probes {
        let ctx = TestContext::new().with_probe(probe);
        let err = ctx.run().unwrap_err();

        assert!(err.is_precondition(), "{label}: {err}");
        assert_eq!(ctx.source.calls(), 0, "{label}");
        ctx.assert_untouched();
    }
}

#[test]
fn all_failures_are_reported_together() {
    let probe = FakeProbe::approved()
        .with_uid(1000)
        .without_path(environment::EFI_DIR);
    let ctx = TestContext::new().with_probe(probe);

    let msg = ctx.run().unwrap_err().to_string();
    assert!(msg.contains("must be run as root"), "{msg}");
    assert!(msg.contains("UEFI"), "{msg}");
}

#[test]
fn run_validated_refuses_failing_result() {
    let ctx = TestContext::new();
    let safety = SafetyCheckResult {
        is_uefi_boot: false,
        ..SafetyCheckResult::passing("VirtualBox")
    };

    let err = ctx.pipeline().run_validated(safety).unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(ctx.source.calls(), 0);
    ctx.assert_untouched();
}

// ============================================================================
// ARTIFACT BEFORE DISK
// ============================================================================

#[test]
fn artifact_failure_stops_before_provisioning() {
    let ctx = TestContext::new().with_source(StaticArtifactSource::failing(
        "Desired artifact 'arch-installation' not found",
    ));

    let err = ctx.run().unwrap_err();
    assert!(matches!(err, VmstrapError::Artifact(_)));
    assert_eq!(ctx.source.calls(), 1);
    ctx.assert_untouched();
}

#[test]
fn empty_payload_stops_before_provisioning() {
    let ctx = TestContext::new().with_source(StaticArtifactSource::new(Vec::new()));

    let err = ctx.run().unwrap_err();
    assert!(err.to_string().contains("empty"), "{err}");
    ctx.assert_untouched();
}

// ============================================================================
// FULL RUN
// ============================================================================

#[test]
fn full_run_installs_and_configures() {
    let ctx = TestContext::new();
    let report = ctx.run().unwrap();

    assert_eq!(report.hostname, "vmhost");
    assert_eq!(report.username, "alice");
    assert_eq!(report.mounts.root.device, Path::new("/dev/sda3"));
    assert_eq!(report.metrics.completed(), StageKind::ALL.to_vec());

    // Payload landed in the new root.
    assert_eq!(
        std::fs::read_to_string(ctx.root().join("etc/os-release")).unwrap(),
        "NAME=\"Arch Linux\"\n"
    );

    // fstab was appended from blkid UUIDs.
    let fstab = std::fs::read_to_string(ctx.root().join("etc/fstab")).unwrap();
    assert!(fstab.contains("# /dev/sda3\nUUID=uuid-sda3\t/\text4"), "{fstab}");
    assert!(fstab.contains("UUID=uuid-sda1\t/boot\tvfat"), "{fstab}");
    assert!(fstab.contains("UUID=uuid-sda2\tnone\tswap"), "{fstab}");
    let targets: Vec<_> = report.fstab.iter().map(|e| e.target.as_str()).collect();
    assert_eq!(targets, vec!["/", "/boot", "none"]);

    // Configuration crossed the boundary exactly once, then cleaned up.
    let lines = ctx.runner.command_lines();
    assert_eq!(
        lines.last().unwrap(),
        &format!("arch-chroot {} /root/vmstrap-configure.sh", ctx.root().display())
    );
    assert_eq!(ctx.runner.count("arch-chroot"), 1);
    assert!(!ctx.script_on_host().exists());
}

#[test]
fn full_run_prompts_in_order() {
    let ctx = TestContext::new();
    ctx.run().unwrap();

    assert_eq!(
        ctx.prompter.asked(),
        vec![
            "WARNING: This will wipe all data on /dev/sda.",
            "Enter hostname: ",
            "Enter username: ",
            "Enter user password: ",
            "Enter root password: ",
        ]
    );
}

#[test]
fn secrets_never_reach_a_command_line() {
    let ctx = TestContext::new();
    ctx.run().unwrap();

    for line in ctx.runner.command_lines() {
        assert!(!line.contains("rootpw"), "{line}");
    }
}

#[test]
fn failing_chroot_is_fatal_and_removes_script() {
    let runner = RecordingRunner::new()
        .fake_blkid()
        .fail_on("arch-chroot", "/root/vmstrap-configure.sh");
    let ctx = TestContext::new().with_runner(runner);

    let err = ctx.run().unwrap_err();
    assert!(matches!(err, VmstrapError::Command { ref program, .. } if program == "arch-chroot"));
    assert!(!ctx.script_on_host().exists());
    assert_eq!(ctx.runner.programs().last().map(String::as_str), Some("arch-chroot"));
}

#[test]
fn missing_blkid_uuid_stops_before_configuring() {
    let runner = RecordingRunner::new().stdout_for("blkid", "\n");
    let ctx = TestContext::new().with_runner(runner);

    let err = ctx.run().unwrap_err();
    assert!(err.to_string().contains("No filesystem UUID"), "{err}");
    assert_eq!(ctx.runner.count("arch-chroot"), 0);
}
