/// Lifecycle state of the followed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetState {
    /// Target matched in the most recent cycle
    Active,
    /// No detection overlapped the target; it has been cleared
    #[default]
    Lost,
}
