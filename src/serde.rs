/// Skips serializing a field that still holds its `Default` value.
pub fn skip_serializing_if_default<E: Default + PartialEq>(e: &E) -> bool {
    e == &E::default()
}
