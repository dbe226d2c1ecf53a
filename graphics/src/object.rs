//! Drawable objects as seen by the binding layer.
//!
//! An object contributes a geometry and, optionally, instance attributes and
//! a skeleton. Instance attributes live on the object rather than on the
//! geometry, so two objects can share one geometry while drawing different
//! instance sets.

use std::sync::Arc;

use parking_lot::Mutex;
use vbind_core::{Attribute, CoreError, GeometryRef};

vbind_core::define_id!(
    /// Identity of a drawable object.
    ObjectId
);

vbind_core::define_id!(
    /// Identity of a skeleton.
    SkeletonId
);

/// Program input name fed by an object's instance matrices.
pub const INSTANCE_MATRIX: &str = "instanceMatrix";

/// Program input name fed by an object's instance colors.
pub const INSTANCE_COLOR: &str = "instanceColor";

/// A pose that is recomputed at most once per frame.
pub trait Skeleton: Send {
    fn skeleton_id(&self) -> SkeletonId;

    /// Recompute bone matrices for the current frame.
    fn update_pose(&mut self);
}

/// Shared handle to a skeleton.
pub type SkeletonRef = Arc<Mutex<dyn Skeleton>>;

/// Anything the binder can draw.
pub trait Drawable {
    fn object_id(&self) -> ObjectId;

    fn geometry(&self) -> &GeometryRef;

    /// Whether the object draws many instances of its geometry.
    fn is_instanced(&self) -> bool {
        false
    }

    /// Number of instances drawn.
    fn instance_count(&self) -> u32 {
        1
    }

    /// Per-instance 4x4 transform, sixteen floats per instance.
    fn instance_matrix(&self) -> Option<&Attribute> {
        None
    }

    /// Per-instance color.
    fn instance_color(&self) -> Option<&Attribute> {
        None
    }

    fn skeleton(&self) -> Option<&SkeletonRef> {
        None
    }
}

/// Resolve the attribute feeding program input `name`.
///
/// Geometry attributes win; the object's instance matrix and color stand in
/// for the reserved instance input names.
pub(crate) fn resolve_attribute<'a>(
    name: &str,
    geometry: &'a vbind_core::Geometry,
    object: &'a dyn Drawable,
) -> Option<&'a Attribute> {
    geometry.attribute(name).or_else(|| match name {
        INSTANCE_MATRIX => object.instance_matrix(),
        INSTANCE_COLOR => object.instance_color(),
        _ => None,
    })
}

#[derive(Debug, Clone)]
struct Instances {
    count: u32,
    matrix: Attribute,
    color: Option<Attribute>,
}

/// A plain drawable: a geometry, optionally instanced or skinned.
#[derive(Clone)]
pub struct DrawObject {
    id: ObjectId,
    geometry: GeometryRef,
    instances: Option<Instances>,
    skeleton: Option<SkeletonRef>,
}

impl DrawObject {
    /// Object drawing `geometry` once.
    pub fn new(geometry: GeometryRef) -> Self {
        Self {
            id: ObjectId::new(),
            geometry,
            instances: None,
            skeleton: None,
        }
    }

    /// Object drawing `count` instances of `geometry`, all at the identity transform.
    pub fn instanced(geometry: GeometryRef, count: u32) -> Result<Self, CoreError> {
        const IDENTITY: [f32; 16] = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        let matrices: Vec<f32> = IDENTITY.iter().copied().cycle().take(16 * count as usize).collect();
        let matrix = Attribute::instanced(matrices, 16, 1)?;
        Ok(Self {
            id: ObjectId::new(),
            geometry,
            instances: Some(Instances {
                count,
                matrix,
                color: None,
            }),
            skeleton: None,
        })
    }

    /// Attach per-instance colors, three floats per instance.
    ///
    /// Fails with [`CoreError::NotInstanced`] on an object built with [`DrawObject::new`].
    pub fn with_instance_colors(mut self, colors: Vec<f32>) -> Result<Self, CoreError> {
        let Some(instances) = &mut self.instances else {
            return Err(CoreError::NotInstanced);
        };
        instances.color = Some(Attribute::instanced(colors, 3, 1)?);
        Ok(self)
    }

    pub fn with_skeleton(mut self, skeleton: SkeletonRef) -> Self {
        self.skeleton = Some(skeleton);
        self
    }

    /// Mutable per-instance matrices, for writing transforms.
    pub fn instance_matrix_mut(&mut self) -> Option<&mut Attribute> {
        self.instances.as_mut().map(|instances| &mut instances.matrix)
    }
}

impl Drawable for DrawObject {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn geometry(&self) -> &GeometryRef {
        &self.geometry
    }

    fn is_instanced(&self) -> bool {
        self.instances.is_some()
    }

    fn instance_count(&self) -> u32 {
        self.instances.as_ref().map_or(1, |instances| instances.count)
    }

    fn instance_matrix(&self) -> Option<&Attribute> {
        self.instances.as_ref().map(|instances| &instances.matrix)
    }

    fn instance_color(&self) -> Option<&Attribute> {
        self.instances.as_ref().and_then(|instances| instances.color.as_ref())
    }

    fn skeleton(&self) -> Option<&SkeletonRef> {
        self.skeleton.as_ref()
    }
}

impl std::fmt::Debug for DrawObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawObject")
            .field("id", &self.id)
            .field("instances", &self.instances)
            .field("skinned", &self.skeleton.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vbind_core::Geometry;

    #[test]
    fn test_instanced_object() {
        let object = DrawObject::instanced(Geometry::new().into_shared(), 4)
            .unwrap()
            .with_instance_colors(vec![1.0; 12])
            .unwrap();
        assert!(object.is_instanced());
        assert_eq!(object.instance_count(), 4);
        assert_eq!(object.instance_matrix().unwrap().count(), 4);
        assert_eq!(object.instance_color().unwrap().kind().divisor(), 1);
    }

    #[test]
    fn test_colors_need_instances() {
        let result = DrawObject::new(Geometry::new().into_shared()).with_instance_colors(vec![1.0; 3]);
        assert_eq!(result.err(), Some(CoreError::NotInstanced));
    }

    #[test]
    fn test_resolve_prefers_geometry() {
        let mut geometry = Geometry::new();
        let object = DrawObject::instanced(Geometry::new().into_shared(), 2).unwrap();
        let from_object = resolve_attribute(INSTANCE_MATRIX, &geometry, &object).unwrap().id();
        assert_eq!(from_object, object.instance_matrix().unwrap().id());

        geometry.set_attribute(INSTANCE_MATRIX, Attribute::instanced(vec![0.0f32; 32], 16, 1).unwrap());
        let from_geometry = resolve_attribute(INSTANCE_MATRIX, &geometry, &object).unwrap().id();
        assert_ne!(from_geometry, from_object);
        assert!(resolve_attribute("uv", &geometry, &object).is_none());
    }

    #[test]
    fn test_plain_object_defaults() {
        let object = DrawObject::new(Geometry::new().into_shared());
        assert!(!object.is_instanced());
        assert_eq!(object.instance_count(), 1);
        assert!(object.instance_matrix().is_none());
        assert!(object.skeleton().is_none());
    }
}
