//! Field injection for sort and key columns
//!
//! Backends need every column referenced by a sort or key criterion in the
//! fetched row, whether or not the caller selected it. Injection walks each
//! path from the root request, adding the minimal to-one nodes and the scalar
//! leaf that are missing. It never removes or reorders what is already there.

use crate::core::error::CompileError;
use crate::core::request::{FieldPath, ObjectRequest};
use crate::core::type_config::FieldKind;

/// Return `request` extended so that every path in `paths` is present as scalar fields
pub fn inject_field_paths(
    request: ObjectRequest,
    paths: &[FieldPath],
) -> Result<ObjectRequest, CompileError> {
    paths.iter().try_fold(request, |request, path| {
        path.ensure_injectable()?;
        Ok(inject(request, path))
    })
}

fn inject(mut request: ObjectRequest, path: &FieldPath) -> ObjectRequest {
    let segments = path.segments();
    let mut node = &mut request;

    for hop in &segments[..segments.len() - 1] {
        let children = match hop.kind {
            FieldKind::ObjectRef => &mut node.object_fields,
            _ => &mut node.nested_object_fields,
        };
        node = children
            .entry(hop.name.clone())
            .or_insert_with(|| ObjectRequest::new(&hop.type_name));
    }

    let leaf = path.leaf();
    if !node.has_scalar_field(&leaf.name) {
        node.scalar_fields.push(leaf.clone());
    }
    request
}
