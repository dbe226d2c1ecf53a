//! Per-frame update coordination.
//!
//! A geometry drawn by many objects, an instanced object drawn in several
//! passes or a skeleton shared by many meshes is updated once per frame.
//! Each is stamped with the frame number of its last update; a matching
//! stamp means there is nothing to do.

use std::collections::HashMap;

use vbind_core::GeometryId;
use vbind_core::profiling::profile_scope;

use crate::attributes::AttributeStore;
use crate::backend::{BufferTarget, GpuContext};
use crate::object::{Drawable, ObjectId, SkeletonId};
use crate::registry::{GeometryRegistry, UploadSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Stamp {
    Geometry(GeometryId),
    Instances(ObjectId),
    Skeleton(SkeletonId),
}

/// What one [`FrameCoordinator::update`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameUpdate {
    /// Attribute uploads, if the geometry was visited this call.
    pub geometry: Option<UploadSummary>,
    /// Instance buffers sent to the GPU.
    pub instance_uploads: usize,
    /// Whether the skeleton pose was recomputed.
    pub skeleton_updated: bool,
}

/// Frame counter plus last-update stamps.
#[derive(Debug, Default)]
pub struct FrameCoordinator {
    frame: u64,
    stamps: HashMap<Stamp, u64>,
}

impl FrameCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next frame and return its number.
    pub fn begin_frame(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }

    /// Current frame number.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Register `object`'s geometry and bring everything it draws with up to date.
    pub fn update(
        &mut self,
        ctx: &mut dyn GpuContext,
        store: &mut AttributeStore,
        registry: &mut GeometryRegistry,
        object: &dyn Drawable,
    ) -> FrameUpdate {
        profile_scope!("frame_update");

        let mut update = FrameUpdate::default();
        {
            let geometry = object.geometry().read();
            registry.register(&geometry);
            if self.stamp(Stamp::Geometry(geometry.id())) {
                update.geometry = Some(registry.upload_attributes(ctx, store, &geometry));
            }
        }

        let instanced = object.instance_matrix().is_some() || object.instance_color().is_some();
        if instanced && self.stamp(Stamp::Instances(object.object_id())) {
            for attribute in object.instance_matrix().into_iter().chain(object.instance_color()) {
                if store.update(ctx, attribute, BufferTarget::Vertex).transferred() {
                    update.instance_uploads += 1;
                }
            }
        }

        if let Some(skeleton) = object.skeleton() {
            let mut skeleton = skeleton.lock();
            if self.stamp(Stamp::Skeleton(skeleton.skeleton_id())) {
                skeleton.update_pose();
                update.skeleton_updated = true;
            }
        }

        update
    }

    /// Forget the stamps of a geometry, so its next visit re-checks uploads.
    pub fn forget_geometry(&mut self, geometry: GeometryId) {
        self.stamps.remove(&Stamp::Geometry(geometry));
    }

    /// Forget the stamps of an object.
    pub fn forget_object(&mut self, object: ObjectId) {
        self.stamps.remove(&Stamp::Instances(object));
    }

    pub fn forget_skeleton(&mut self, skeleton: SkeletonId) {
        self.stamps.remove(&Stamp::Skeleton(skeleton));
    }

    /// Forget every stamp.
    pub fn reset(&mut self) {
        self.stamps.clear();
    }

    /// Number of live stamps.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Stamp `key` with the current frame. Returns `false` if already stamped.
    fn stamp(&mut self, key: Stamp) -> bool {
        self.stamps.insert(key, self.frame) != Some(self.frame)
    }
}
