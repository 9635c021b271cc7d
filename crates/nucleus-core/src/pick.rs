//! Pointer picking
//!
//! A click is resolved in three steps: the pointer position is converted
//! to normalized device coordinates, the external ray caster turns that
//! into a world ray and intersects it with the candidate parts, and the
//! nearest hit is mapped back to its registry entry.

use glam::{Vec2, Vec3};
use std::hash::Hash;

use crate::registry::{PartEntry, PartRegistry};

/// Pointer position in pixels, relative to a viewport of `width` x `height`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PointerPosition {
    pub fn new(position: Vec2, viewport: Vec2) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width: viewport.x,
            height: viewport.y,
        }
    }

    /// Normalized device coordinates: x and y in `[-1, 1]`, +y up.
    ///
    /// Returns `None` for an empty viewport.
    pub fn to_ndc(&self) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            (self.x / self.width) * 2.0 - 1.0,
            -(self.y / self.height) * 2.0 + 1.0,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// One intersection between a ray and a rendered part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit<H> {
    pub handle: H,
    pub distance: f32,
}

/// Camera projection plus ray intersection, provided by the renderer
pub trait RayCaster {
    type Handle: Copy + Eq + Hash;

    /// World ray through the given NDC point
    fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray>;

    /// Intersections of `ray` with `candidates`, nearest first
    fn intersect(&mut self, ray: &Ray, candidates: &[Self::Handle]) -> Vec<RayHit<Self::Handle>>;
}

pub struct PickResolver;

impl PickResolver {
    /// Resolve a pointer position to the nearest intersected part.
    ///
    /// Only `candidates` are tested. Hits on handles the registry does not
    /// know are ignored. Equal distances go to the part registered first.
    pub fn resolve<'r, C, L>(
        pointer: PointerPosition,
        caster: &mut C,
        registry: &'r PartRegistry<C::Handle, L>,
        candidates: &[C::Handle],
    ) -> Option<&'r PartEntry<C::Handle, L>>
    where
        C: RayCaster,
    {
        if candidates.is_empty() {
            return None;
        }

        let ndc = pointer.to_ndc()?;
        let ray = caster.ray_from_ndc(ndc)?;
        let hits = caster.intersect(&ray, candidates);

        let mut best: Option<(f32, &PartEntry<C::Handle, L>)> = None;
        for hit in hits {
            if !hit.distance.is_finite() {
                continue;
            }
            let Some(entry) = registry.lookup_by_handle(hit.handle) else {
                continue;
            };
            let closer = match best {
                None => true,
                Some((distance, current)) => {
                    hit.distance < distance
                        || (hit.distance == distance && entry.id() < current.id())
                }
            };
            if closer {
                best = Some((hit.distance, entry));
            }
        }

        best.map(|(_, entry)| entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a fixed hit list and records the candidates it was given
    struct FixedCaster {
        hits: Vec<RayHit<u32>>,
        last_candidates: Vec<u32>,
    }

    impl FixedCaster {
        fn new(hits: &[(u32, f32)]) -> Self {
            Self {
                hits: hits
                    .iter()
                    .map(|&(handle, distance)| RayHit { handle, distance })
                    .collect(),
                last_candidates: Vec::new(),
            }
        }
    }

    impl RayCaster for FixedCaster {
        type Handle = u32;

        fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
            Some(Ray {
                origin: Vec3::new(ndc.x, ndc.y, 20.0),
                direction: Vec3::NEG_Z,
            })
        }

        fn intersect(&mut self, _ray: &Ray, candidates: &[u32]) -> Vec<RayHit<u32>> {
            self.last_candidates = candidates.to_vec();
            self.hits
                .iter()
                .filter(|h| candidates.contains(&h.handle))
                .copied()
                .collect()
        }
    }

    fn registry() -> PartRegistry<u32, usize> {
        let mut registry = PartRegistry::new();
        registry.register("H1", 1).unwrap();
        registry.register("H2", 2).unwrap();
        registry.register("H3", 3).unwrap();
        registry
    }

    fn centre() -> PointerPosition {
        PointerPosition::new(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_nearest_hit_wins() {
        let registry = registry();
        let mut caster = FixedCaster::new(&[(2, 2.0), (1, 5.0)]);

        let picked = PickResolver::resolve(centre(), &mut caster, &registry, &[1, 2, 3]).unwrap();
        assert_eq!(picked.name(), "H2");
    }

    #[test]
    fn test_unsorted_hits_still_pick_nearest() {
        let registry = registry();
        let mut caster = FixedCaster::new(&[(1, 5.0), (2, 2.0)]);

        let picked = PickResolver::resolve(centre(), &mut caster, &registry, &[1, 2]).unwrap();
        assert_eq!(picked.name(), "H2");
    }

    #[test]
    fn test_no_hits_is_none() {
        let registry = registry();
        let mut caster = FixedCaster::new(&[]);

        assert!(PickResolver::resolve(centre(), &mut caster, &registry, &[1, 2, 3]).is_none());
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let registry = registry();
        let mut caster = FixedCaster::new(&[(3, 4.0), (2, 4.0)]);

        let picked = PickResolver::resolve(centre(), &mut caster, &registry, &[1, 2, 3]).unwrap();
        assert_eq!(picked.name(), "H2");
    }

    #[test]
    fn test_unregistered_hit_is_ignored() {
        let registry = registry();
        let mut caster = FixedCaster::new(&[(99, 1.0), (3, 8.0)]);

        let picked = PickResolver::resolve(centre(), &mut caster, &registry, &[99, 3]).unwrap();
        assert_eq!(picked.name(), "H3");
    }

    #[test]
    fn test_only_candidates_are_tested() {
        let registry = registry();
        let mut caster = FixedCaster::new(&[(2, 2.0), (1, 5.0)]);

        let picked = PickResolver::resolve(centre(), &mut caster, &registry, &[1]).unwrap();
        assert_eq!(picked.name(), "H1");
        assert_eq!(caster.last_candidates, vec![1]);

        assert!(PickResolver::resolve(centre(), &mut caster, &registry, &[]).is_none());
    }

    #[test]
    fn test_pointer_to_ndc() {
        let ndc = centre().to_ndc().unwrap();
        assert_eq!(ndc, Vec2::ZERO);

        let top_left = PointerPosition::new(Vec2::ZERO, Vec2::new(800.0, 600.0));
        assert_eq!(top_left.to_ndc().unwrap(), Vec2::new(-1.0, 1.0));

        let bottom_right = PointerPosition::new(Vec2::new(800.0, 600.0), Vec2::new(800.0, 600.0));
        assert_eq!(bottom_right.to_ndc().unwrap(), Vec2::new(1.0, -1.0));

        let empty = PointerPosition::new(Vec2::new(1.0, 1.0), Vec2::ZERO);
        assert!(empty.to_ndc().is_none());
    }

    #[test]
    fn test_degenerate_viewport_picks_nothing() {
        let registry = registry();
        let mut caster = FixedCaster::new(&[(1, 1.0)]);
        let pointer = PointerPosition::new(Vec2::new(10.0, 10.0), Vec2::new(0.0, 600.0));

        assert!(PickResolver::resolve(pointer, &mut caster, &registry, &[1]).is_none());
        assert!(caster.last_candidates.is_empty());
    }
}
