use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_MATERIAL_ID: AtomicU32 = AtomicU32::new(0);
static NEXT_CONTACT_MATERIAL_ID: AtomicU32 = AtomicU32::new(0);

/// Tag attached to shapes; contact parameters are looked up per material pair.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl MaterialId {
    pub fn new() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for MaterialId {
    fn default() -> Self {
        Self::new()
    }
}

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ContactMaterialId(pub u32);

/// Contact parameters used when two materials meet.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactMaterial {
    pub id: ContactMaterialId,
    pub material_a: Option<MaterialId>,
    pub material_b: Option<MaterialId>,
    pub friction: f32,
    pub restitution: f32,
    pub stiffness: f32,
    pub relaxation: f32,
    pub friction_stiffness: f32,
    pub friction_relaxation: f32,
    /// Tangential target speed, e.g. for conveyor belts.
    pub surface_velocity: f32,
    /// Contacts are generated this far before actual overlap.
    pub contact_skin_size: f32,
}

impl ContactMaterial {
    pub fn new(material_a: MaterialId, material_b: MaterialId) -> Self {
        Self {
            material_a: Some(material_a),
            material_b: Some(material_b),
            ..Self::default()
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Whether this entry applies to the (unordered) material pair.
    pub fn matches(&self, a: MaterialId, b: MaterialId) -> bool {
        let (ma, mb) = (self.material_a, self.material_b);
        (ma == Some(a) && mb == Some(b)) || (ma == Some(b) && mb == Some(a))
    }
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            id: ContactMaterialId(NEXT_CONTACT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed)),
            material_a: None,
            material_b: None,
            friction: 0.3,
            restitution: 0.0,
            stiffness: 1e6,
            relaxation: 4.0,
            friction_stiffness: 1e6,
            friction_relaxation: 4.0,
            surface_velocity: 0.0,
            contact_skin_size: 0.005,
        }
    }
}
