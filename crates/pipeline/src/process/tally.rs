/// The completion barrier for a run.
///
/// Counts every member seen in the archive against the ones that have
/// settled, one way or another. Repackaging is only allowed once the reader
/// has reached the end of the archive and nothing is left in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    /// Members read from the archive, directories included.
    pub seen: u64,
    /// Members written to the staging tree.
    pub staged: u64,
    /// Directory entries.
    pub skipped: u64,
    /// Members left out of the staging tree because of an error.
    pub failed: u64,
    /// The reader got through the whole archive.
    pub end_of_archive: bool,
}
impl Tally {
    pub fn settled(&self) -> u64 {
        self.staged + self.skipped + self.failed
    }

    pub fn in_flight(&self) -> u64 {
        self.seen.saturating_sub(self.settled())
    }

    pub fn is_complete(&self) -> bool {
        self.end_of_archive && self.settled() == self.seen
    }
}
