use rustc_hash::FxHashMap;

/// Bookkeeping shared by the normalizer and the entity factories for one
/// normalization plus tree build.
///
/// The normalizer resets it after re-parsing so names handed out for the
/// previous snapshot do not leak into the final tree.
#[derive(Debug, Default)]
pub struct PassState {
    struct_names: FxHashMap<String, usize>,
}

impl PassState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `base` the first time it is requested and `base_1`, `base_2`,
    /// ... afterwards.
    pub fn unique_struct_name(&mut self, base: &str) -> String {
        let uses = self.struct_names.entry(base.to_string()).or_insert(0);
        let name = if *uses == 0 {
            base.to_string()
        } else {
            format!("{base}_{uses}")
        };
        *uses += 1;
        name
    }

    pub fn reset(&mut self) {
        self.struct_names.clear();
    }
}
