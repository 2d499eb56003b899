//! Collision layer tables
//!
//! Two object layers map one-to-one onto two broad-phase buckets. Static
//! level geometry never needs to collide with itself, so `NonMoving` pairs
//! only with `Moving`, while `Moving` pairs with everything.
//!
//! The rule is checked twice inside the engine: coarsely through the
//! collider's [`InteractionGroups`] (broad phase) and exactly through
//! [`LayerPairFilter`] (narrow phase). The coarse check may admit more
//! pairs than the exact one, never fewer. Any new layer must keep that
//! ordering; `test_broad_phase_never_rejects_narrow_pair` enforces it.

use rapier3d::prelude::{
    Group, InteractionGroups, PairFilterContext, PhysicsHooks, SolverFlags,
};
use serde::{Deserialize, Serialize};

/// Coarse category of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectLayer {
    /// Static world and level geometry
    NonMoving = 0,
    /// Kinematic and dynamic bodies
    Moving = 1,
}

/// Broad-phase bucket a layer lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BroadPhaseLayer {
    NonMoving = 0,
    Moving = 1,
}

impl ObjectLayer {
    pub const ALL: [ObjectLayer; 2] = [ObjectLayer::NonMoving, ObjectLayer::Moving];

    pub fn broad_phase_layer(self) -> BroadPhaseLayer {
        match self {
            ObjectLayer::NonMoving => BroadPhaseLayer::NonMoving,
            ObjectLayer::Moving => BroadPhaseLayer::Moving,
        }
    }

    /// Collider user-data tag carrying this layer into the engine
    pub fn to_tag(self) -> u128 {
        self as u128
    }

    pub fn from_tag(tag: u128) -> Option<Self> {
        match tag {
            0 => Some(ObjectLayer::NonMoving),
            1 => Some(ObjectLayer::Moving),
            _ => None,
        }
    }

    /// Engine membership/filter bits for the broad-phase check
    pub fn interaction_groups(self) -> InteractionGroups {
        let memberships = self.broad_phase_layer().group();
        let filter = BroadPhaseLayer::ALL
            .into_iter()
            .filter(|bp| object_vs_broad_phase_collide(self, *bp))
            .fold(Group::NONE, |acc, bp| acc | bp.group());
        InteractionGroups::new(memberships, filter)
    }
}

impl BroadPhaseLayer {
    pub const ALL: [BroadPhaseLayer; 2] = [BroadPhaseLayer::NonMoving, BroadPhaseLayer::Moving];

    fn group(self) -> Group {
        match self {
            BroadPhaseLayer::NonMoving => Group::GROUP_1,
            BroadPhaseLayer::Moving => Group::GROUP_2,
        }
    }
}

/// Exact object-layer pair rule
pub fn object_layers_collide(a: ObjectLayer, b: ObjectLayer) -> bool {
    match a {
        ObjectLayer::NonMoving => b == ObjectLayer::Moving,
        ObjectLayer::Moving => true,
    }
}

/// Coarse rule: may an object of layer `layer` touch anything in bucket `bucket`?
pub fn object_vs_broad_phase_collide(layer: ObjectLayer, bucket: BroadPhaseLayer) -> bool {
    match layer {
        ObjectLayer::NonMoving => bucket == BroadPhaseLayer::Moving,
        ObjectLayer::Moving => true,
    }
}

/// Narrow-phase hook applying [`object_layers_collide`] to each candidate pair
#[derive(Debug, Default, Clone, Copy)]
pub struct LayerPairFilter;

impl LayerPairFilter {
    fn layers(context: &PairFilterContext) -> Option<(ObjectLayer, ObjectLayer)> {
        let a = context.colliders.get(context.collider1)?;
        let b = context.colliders.get(context.collider2)?;
        Some((
            ObjectLayer::from_tag(a.user_data)?,
            ObjectLayer::from_tag(b.user_data)?,
        ))
    }
}

impl PhysicsHooks for LayerPairFilter {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        match Self::layers(context) {
            Some((a, b)) if !object_layers_collide(a, b) => None,
            _ => Some(SolverFlags::COMPUTE_IMPULSES),
        }
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        Self::layers(context).map_or(true, |(a, b)| object_layers_collide(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_table() {
        use ObjectLayer::*;
        assert!(!object_layers_collide(NonMoving, NonMoving));
        assert!(object_layers_collide(NonMoving, Moving));
        assert!(object_layers_collide(Moving, NonMoving));
        assert!(object_layers_collide(Moving, Moving));
    }

    #[test]
    fn test_pair_rule_is_symmetric() {
        for a in ObjectLayer::ALL {
            for b in ObjectLayer::ALL {
                assert_eq!(object_layers_collide(a, b), object_layers_collide(b, a));
            }
        }
    }

    #[test]
    fn test_broad_phase_never_rejects_narrow_pair() {
        for a in ObjectLayer::ALL {
            for b in ObjectLayer::ALL {
                if object_layers_collide(a, b) {
                    assert!(
                        object_vs_broad_phase_collide(a, b.broad_phase_layer()),
                        "bucket check rejects {a:?} vs {b:?}"
                    );
                    assert!(
                        a.interaction_groups().test(b.interaction_groups()),
                        "interaction groups reject {a:?} vs {b:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_static_pairs_are_culled_in_broad_phase() {
        let groups = ObjectLayer::NonMoving.interaction_groups();
        assert!(!groups.test(groups));
    }

    #[test]
    fn test_tag_round_trip() {
        for layer in ObjectLayer::ALL {
            assert_eq!(ObjectLayer::from_tag(layer.to_tag()), Some(layer));
        }
        assert_eq!(ObjectLayer::from_tag(7), None);
    }
}
