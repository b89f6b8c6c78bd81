/// Request to run one incremental merge-and-mask pass over the named blobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunEtl {
    pub incident_blob: Option<String>,
    pub journal_blob: Option<String>,
}
