#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Fetch the listing at `offset` and resolve its details.
    FetchPage { offset: usize, limit: usize },
}
