/// Build a zstd-compressed tarball of regular files.
pub fn rootfs_tar_zst(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).expect("valid tar path");
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_uid(0);
        header.set_gid(0);
        header.set_cksum();
        builder
            .append(&header, content.as_bytes())
            .expect("append tar entry");
    }
    let tar = builder.into_inner().expect("finish tar");
    zstd::stream::encode_all(&tar[..], 3).expect("zstd encode")
}
