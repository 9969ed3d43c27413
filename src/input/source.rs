/// Pointer (mouse/pen) identifier from the host.
pub type PointerId = u64;
/// Touch point identifier from the host.
pub type TouchId = u64;

/// Something that can hold a key down.
///
/// A pitch stays held while at least one source holds it, so a key pressed
/// on the keyboard and by the mouse at once only goes up when both let go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// Computer key, stored lowercase.
    Key(char),
    Pointer(PointerId),
    Touch(TouchId),
}
