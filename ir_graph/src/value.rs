use ty::Ty;

use crate::{Graph, NameError, NodeId, Use, ValueId};

impl<'ctx> Graph<'ctx> {
    pub fn ty(&self, value: ValueId) -> Ty<'ctx> {
        self.values[value].ty
    }

    pub fn set_ty(&mut self, value: ValueId, ty: Ty<'ctx>) {
        self.values[value].ty = ty;
        // The schema of a user may depend on this type.
        for i in 0..self.values[value].uses.len() {
            let user = self.values[value].uses[i].user;
            self.invalidate_schema(user);
        }
    }

    /// The node defining `value`: its producer, or the param node of a block
    /// for block inputs.
    pub fn defining_node(&self, value: ValueId) -> NodeId {
        self.values[value].node
    }

    pub fn offset(&self, value: ValueId) -> usize {
        self.values[value].offset
    }

    pub fn uses(&self, value: ValueId) -> &[Use] {
        &self.values[value].uses
    }

    /// A graph-unique number, never reused.
    pub fn unique(&self, value: ValueId) -> usize {
        self.values[value].unique
    }

    pub fn debug_name(&self, value: ValueId) -> Option<&str> {
        self.values[value].name.as_deref()
    }

    /// The debug name, or the unique number for unnamed values.
    pub fn unique_name(&self, value: ValueId) -> String {
        match self.debug_name(value) {
            Some(name) => name.to_string(),
            None => self.unique(value).to_string(),
        }
    }

    /// The debug name without a numeric `.N` suffix.
    pub fn debug_name_base(&self, value: ValueId) -> String {
        let name = self.unique_name(value);
        split_numeric_suffix(&name)
            .map(|(base, _)| base.to_string())
            .unwrap_or(name)
    }

    /// Names `value`, unique within the graph. A value already holding `name`
    /// is renamed to `name.1`, `name.2`, ... An empty name clears the name.
    pub fn set_debug_name(&mut self, value: ValueId, name: &str) -> Result<(), NameError> {
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NameError::Numeric(name.to_string()));
        }
        self.assign_name(value, name);
        Ok(())
    }

    fn assign_name(&mut self, value: ValueId, name: &str) {
        self.release_name(value);
        if name.is_empty() {
            return;
        }

        if let Some(&old_owner) = self.unique_names.get(name) {
            let (base, mut suffix) = match split_numeric_suffix(name) {
                Some((base, suffix)) => (base, suffix),
                None => (name, 1),
            };
            let replacement = loop {
                let candidate = format!("{base}.{suffix}");
                suffix += 1;
                if !self.unique_names.contains_key(&candidate) {
                    break candidate;
                }
            };
            self.assign_name(old_owner, &replacement);
        }

        self.unique_names.insert(name.to_string(), value);
        self.values[value].name = Some(name.to_string());
    }

    pub(crate) fn release_name(&mut self, value: ValueId) {
        if let Some(name) = self.values[value].name.take() {
            self.unique_names.remove(&name);
        }
    }

    /// The value named `name`, if any.
    pub fn value_by_name(&self, name: &str) -> Option<ValueId> {
        self.unique_names.get(name).copied()
    }

    /// Copies the type and the debug name of `from`. The name moves to `to`
    /// and `from` is renamed.
    pub fn copy_metadata(&mut self, to: ValueId, from: ValueId) {
        self.set_ty(to, self.ty(from));
        if let Some(name) = self.values[from].name.clone() {
            self.assign_name(to, &name);
        }
    }

    pub(crate) fn copy_metadata_from(&mut self, to: ValueId, src: &Graph<'ctx>, from: ValueId) {
        self.set_ty(to, src.ty(from));
        if let Some(name) = src.debug_name(from) {
            self.assign_name(to, name);
        }
    }

    pub fn replace_first_use_with(&mut self, value: ValueId, new_value: ValueId) {
        let u = *self.values[value]
            .uses
            .first()
            .unwrap_or_else(|| panic!("{} has no uses", self.display_value(value)));
        self.invalidate_schema(u.user);
        self.nodes[u.user].inputs[u.offset] = new_value;
        self.values[new_value].uses.push(u);
        self.values[value].uses.remove(0);
    }

    pub fn replace_all_uses_of_value_with(&mut self, value: ValueId, new_value: ValueId) {
        while !self.values[value].uses.is_empty() {
            self.replace_first_use_with(value, new_value);
        }
    }
}

/// Splits `x.12` into `("x", 12)`.
fn split_numeric_suffix(name: &str) -> Option<(&str, usize)> {
    let (base, suffix) = name.rsplit_once('.')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, suffix.parse().ok()?))
}
