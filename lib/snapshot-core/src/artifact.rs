use alloc::string::String;
use core::fmt;

use crate::record::Record;
use crate::{ExecutionContext, PageFlags, ProcessDescriptor, TrapFrame, PAGE_SIZE};

/// One named file of a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Artifact {
    Pages,
    Flags,
    Context,
    TrapFrame,
    Descriptor,
    /// Written last; its presence marks the snapshot complete.
    Manifest,
}

impl Artifact {
    pub const ALL: [Artifact; 6] = [
        Artifact::Pages,
        Artifact::Flags,
        Artifact::Context,
        Artifact::TrapFrame,
        Artifact::Descriptor,
        Artifact::Manifest,
    ];

    pub fn default_name(self) -> &'static str {
        match self {
            Artifact::Pages => "page_file",
            Artifact::Flags => "flag_file",
            Artifact::Context => "context_file",
            Artifact::TrapFrame => "tf_file",
            Artifact::Descriptor => "proc_file",
            Artifact::Manifest => "snapshot_manifest",
        }
    }

    /// Size of one record, `None` for the variable-length manifest.
    pub fn record_size(self) -> Option<usize> {
        match self {
            Artifact::Pages => Some(PAGE_SIZE),
            Artifact::Flags => Some(PageFlags::WORD_SIZE),
            Artifact::Context => Some(ExecutionContext::SIZE),
            Artifact::TrapFrame => Some(TrapFrame::SIZE),
            Artifact::Descriptor => Some(ProcessDescriptor::SIZE),
            Artifact::Manifest => None,
        }
    }

    /// Whether the artifact holds exactly one record rather than a stream.
    pub fn is_single_record(self) -> bool {
        match self {
            Artifact::Context | Artifact::TrapFrame | Artifact::Descriptor => true,
            _ => false,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Maps artifacts to file names. An optional prefix lets several snapshots
/// live side by side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtifactNames {
    prefix: String,
}

impl ArtifactNames {
    pub fn with_prefix<T: AsRef<str>>(prefix: T) -> Self {
        Self { prefix: String::from(prefix.as_ref()) }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self, artifact: Artifact) -> String {
        format!("{}{}", self.prefix, artifact.default_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_match_the_syscall_contract() {
        let names = ArtifactNames::default();
        assert_eq!(names.name(Artifact::Pages), "page_file");
        assert_eq!(names.name(Artifact::Flags), "flag_file");
        assert_eq!(names.name(Artifact::Context), "context_file");
        assert_eq!(names.name(Artifact::TrapFrame), "tf_file");
        assert_eq!(names.name(Artifact::Descriptor), "proc_file");

        let names = ArtifactNames::with_prefix("ckpt1.");
        assert_eq!(names.name(Artifact::Manifest), "ckpt1.snapshot_manifest");
    }

    #[test]
    fn only_the_fixed_records_are_single() {
        let singles: usize = Artifact::ALL.iter().filter(|a| a.is_single_record()).count();
        assert_eq!(singles, 3);
        assert_eq!(Artifact::Manifest.record_size(), None);
        assert_eq!(Artifact::Flags.record_size(), Some(8));
    }
}
