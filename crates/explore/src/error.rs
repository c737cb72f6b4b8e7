/// Page wiring failures. Both leave the page inert; the caller logs and
/// carries on.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExploreError {
    #[error("explore button not found")]
    MissingExploreButton,
    #[error("map container not found")]
    MissingMapContainer,
}
