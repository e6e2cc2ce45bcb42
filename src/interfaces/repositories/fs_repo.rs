use std::path::PathBuf;

/// Image store backed by one flat directory on local disk.
#[derive(Clone, Debug)]
pub struct FsImageStore {
    pub root: PathBuf,
}
