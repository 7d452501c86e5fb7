use crate::{Entity, Error, Result, Scene, ShotKey};
use itertools::Itertools;
use log::*;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};

const BOUNDARY_MAX_SHOTS: usize = 1_000_000;

/// The shots of a local bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighborhood {
    /// Shots whose rig instances are optimized.
    pub interior: BTreeSet<ShotKey>,
    /// Shots outside the interior which observe landmarks of the interior. Their rig instances are fixed.
    pub boundary: BTreeSet<ShotKey>,
}

/// Counts the landmarks each shot outside `shots` shares with them.
fn common_point_counts(scene: &Scene, shots: &BTreeSet<ShotKey>) -> HashMap<ShotKey, usize> {
    let points: HashSet<_> = shots
        .iter()
        .flat_map(|&shot| scene.shot(shot).observations.keys().copied())
        .collect();

    let mut common_points: HashMap<ShotKey, usize> = HashMap::new();
    for &point in &points {
        for &neighbor in &scene.landmark(point).observations {
            if !shots.contains(&neighbor) {
                *common_points.entry(neighbor).or_default() += 1;
            }
        }
    }
    common_points
}

/// Ranks shots by shared landmark count, breaking ties by shot id.
fn ranked<'a>(
    scene: &'a Scene,
    common_points: HashMap<ShotKey, usize>,
) -> impl Iterator<Item = (ShotKey, usize)> + 'a {
    common_points
        .into_iter()
        .sorted_by_key(move |&(shot, count)| (Reverse(count), scene.shot(shot).id.as_str()))
}

/// Finds the shots outside `shots` which share landmarks with them.
///
/// Candidates are ranked by the number of shared landmarks, with ties broken by shot id.
/// Whole rig instances are admitted in rank order until a candidate shares fewer than
/// `min_common_points` landmarks or its rig instance does not fit in `max_neighbors`.
pub fn direct_shot_neighbors(
    scene: &Scene,
    shots: &BTreeSet<ShotKey>,
    min_common_points: usize,
    max_neighbors: usize,
) -> BTreeSet<ShotKey> {
    let mut neighbors = BTreeSet::new();
    for (shot, count) in ranked(scene, common_point_counts(scene, shots)) {
        if count < min_common_points {
            break;
        }
        if neighbors.contains(&shot) {
            continue;
        }
        let instance = scene.rig_instance(scene.shot(shot).rig_instance);
        let members: Vec<ShotKey> = instance
            .shots
            .keys()
            .copied()
            .filter(|member| !shots.contains(member) && !neighbors.contains(member))
            .collect();
        if neighbors.len() + members.len() > max_neighbors {
            break;
        }
        neighbors.extend(members);
    }
    neighbors
}

/// Finds every shot outside `shots` which observes at least one of their landmarks.
///
/// Unlike [`direct_shot_neighbors`], rig siblings which share no landmark are not included.
pub fn boundary_shots(scene: &Scene, shots: &BTreeSet<ShotKey>) -> BTreeSet<ShotKey> {
    ranked(scene, common_point_counts(scene, shots))
        .take(BOUNDARY_MAX_SHOTS)
        .map(|(shot, _)| shot)
        .collect()
}

/// Selects the interior and boundary of a local bundle around `central`.
///
/// The interior starts with the rig instance of the central shot and grows by
/// [`direct_shot_neighbors`] for up to `radius - 1` hops, as long as it holds fewer than
/// `max_interior_size` shots.
pub fn shot_neighborhood(
    scene: &Scene,
    central: &str,
    radius: usize,
    min_common_points: usize,
    max_interior_size: usize,
) -> Result<Neighborhood> {
    let central_key = scene
        .shot_key(central)
        .ok_or_else(|| Error::unknown(Entity::Shot, central))?;
    let instance = scene.rig_instance(scene.shot(central_key).rig_instance);
    let mut interior: BTreeSet<ShotKey> = instance.shots.keys().copied().collect();

    for distance in 1..radius {
        if interior.len() >= max_interior_size {
            break;
        }
        let remaining = max_interior_size - interior.len();
        let neighbors = direct_shot_neighbors(scene, &interior, min_common_points, remaining);
        debug!(
            "neighborhood of {} grew by {} shots at distance {}",
            central,
            neighbors.len(),
            distance
        );
        if neighbors.is_empty() {
            break;
        }
        interior.extend(neighbors);
    }

    let boundary = boundary_shots(scene, &interior);
    debug!(
        "neighborhood of {} has {} interior and {} boundary shots",
        central,
        interior.len(),
        boundary.len()
    );
    Ok(Neighborhood { interior, boundary })
}

/// Same as [`shot_neighborhood`], but returns shot ids.
pub fn shot_neighborhood_ids(
    scene: &Scene,
    central: &str,
    radius: usize,
    min_common_points: usize,
    max_interior_size: usize,
) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
    let Neighborhood { interior, boundary } = shot_neighborhood(
        scene,
        central,
        radius,
        min_common_points,
        max_interior_size,
    )?;
    let ids = |shots: BTreeSet<ShotKey>| -> BTreeSet<String> {
        shots
            .into_iter()
            .map(|shot| scene.shot(shot).id.clone())
            .collect()
    };
    Ok((ids(interior), ids(boundary)))
}
