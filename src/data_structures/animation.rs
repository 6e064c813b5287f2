//! Keyframe animation: clips, per-clip actions and the mixer driving them.
//!
//! A clip is a set of tracks, each of which animates one transform channel of
//! one node (addressed by its asset index). The mixer owns one action per clip
//! it has been asked about and, on `update`, samples every running action and
//! writes the results into the local transforms of the bound scene.

use std::sync::Arc;

use cgmath::{InnerSpace, Quaternion, Vector3, VectorSpace};

use crate::data_structures::scene_graph::SceneNode;

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Sample {
    Translation(Vector3<f32>),
    Rotation(Quaternion<f32>),
    Scale(Vector3<f32>),
}

/// One animated channel of one node.
#[derive(Clone, Debug)]
pub struct AnimationTrack {
    pub target: usize,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
}

impl AnimationTrack {
    /// Index of the keyframe at or before `time` and the blend factor towards
    /// the next one. Times outside the track clamp to the first/last frame.
    fn frame_at(&self, time: f32) -> Option<(usize, usize, f32)> {
        let last = self.timestamps.len().checked_sub(1)?;
        if time <= self.timestamps[0] {
            return Some((0, 0, 0.0));
        }
        if time >= self.timestamps[last] {
            return Some((last, last, 0.0));
        }
        // NaN times or timestamps compare false everywhere
        let next = self.timestamps.partition_point(|&t| t <= time);
        let prev = next.checked_sub(1)?;
        let span = *self.timestamps.get(next)? - self.timestamps[prev];
        let factor = if span > 0.0 {
            (time - self.timestamps[prev]) / span
        } else {
            0.0
        };
        Some((prev, next, factor))
    }

    fn sample(&self, time: f32) -> Option<Sample> {
        let (prev, next, factor) = self.frame_at(time)?;
        match &self.keyframes {
            Keyframes::Translation(values) => {
                lerp(values, prev, next, factor).map(Sample::Translation)
            }
            Keyframes::Scale(values) => lerp(values, prev, next, factor).map(Sample::Scale),
            Keyframes::Rotation(values) => {
                let from = *values.get(prev).or(values.last())?;
                let to = *values.get(next).unwrap_or(&from);
                Some(Sample::Rotation(from.slerp(to, factor).normalize()))
            }
            Keyframes::Other => None,
        }
    }
}

fn lerp(values: &[Vector3<f32>], prev: usize, next: usize, factor: f32) -> Option<Vector3<f32>> {
    let from = *values.get(prev).or(values.last())?;
    let to = *values.get(next).unwrap_or(&from);
    Some(from.lerp(to, factor))
}

/// A named animation.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<AnimationTrack>,
    pub duration: f32,
}

impl AnimationClip {
    /// The duration is the latest timestamp of any track.
    pub fn new(name: &str, tracks: Vec<AnimationTrack>) -> Self {
        let duration = tracks
            .iter()
            .filter_map(|track| track.timestamps.last())
            .fold(0.0_f32, |acc, &t| acc.max(t));
        Self {
            name: name.to_string(),
            tracks,
            duration,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    #[default]
    Repeat,
}

/// Playback state of one clip inside a mixer.
#[derive(Debug)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,
    time: f32,
    running: bool,
    loop_mode: LoopMode,
}

impl AnimationAction {
    fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            time: 0.0,
            running: false,
            loop_mode: LoopMode::default(),
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Rewinds to the start without changing whether the action runs.
    pub fn reset(&mut self) -> &mut Self {
        self.time = 0.0;
        self
    }

    pub fn play(&mut self) -> &mut Self {
        self.running = true;
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        self.running = false;
        self.time = 0.0;
        self
    }

    pub fn set_loop(&mut self, loop_mode: LoopMode) -> &mut Self {
        self.loop_mode = loop_mode;
        self
    }

    fn advance(&mut self, dt: f32) {
        if !dt.is_finite() {
            return;
        }
        self.time += dt;
        let duration = self.clip.duration;
        if self.time < duration {
            return;
        }
        match self.loop_mode {
            LoopMode::Repeat if duration > 0.0 && self.time.is_finite() => self.time %= duration,
            LoopMode::Repeat => self.time = 0.0,
            LoopMode::Once => {
                self.time = duration;
                self.running = false;
            }
        }
    }
}

/// Drives the actions of one scene. The mixer does not own the scene: the
/// root it was created for is passed in again on every `update`.
#[derive(Debug)]
pub struct AnimationMixer {
    root: String,
    actions: Vec<AnimationAction>,
    time: f32,
}

impl AnimationMixer {
    pub fn new(root: &dyn SceneNode) -> Self {
        Self {
            root: root.get_name().to_string(),
            actions: Vec::new(),
            time: 0.0,
        }
    }

    /// Name of the root node this mixer was bound to.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Global mixer time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Returns the action for `clip`, creating it on first use.
    pub fn clip_action(&mut self, clip: &Arc<AnimationClip>) -> &mut AnimationAction {
        let idx = match self
            .actions
            .iter()
            .position(|action| Arc::ptr_eq(&action.clip, clip))
        {
            Some(idx) => idx,
            None => {
                self.actions.push(AnimationAction::new(Arc::clone(clip)));
                self.actions.len() - 1
            }
        };
        &mut self.actions[idx]
    }

    pub fn existing_action(&self, name: &str) -> Option<&AnimationAction> {
        self.actions.iter().find(|action| action.clip.name == name)
    }

    pub fn running_actions(&self) -> impl Iterator<Item = &AnimationAction> {
        self.actions.iter().filter(|action| action.running)
    }

    pub fn stop_all_action(&mut self) {
        self.actions.iter_mut().for_each(|action| {
            action.stop();
        });
    }

    /// Advances every running action by `dt` seconds and applies the sampled
    /// poses to `root`. World transforms are refreshed afterwards.
    /// Non-finite `dt` values are ignored.
    pub fn update(&mut self, dt: f32, root: &mut dyn SceneNode) {
        if !dt.is_finite() {
            log::warn!("ignoring non-finite animation step {dt}");
            return;
        }
        self.time += dt;
        let mut samples = Vec::new();
        for action in self.actions.iter_mut().filter(|action| action.running) {
            action.advance(dt);
            for track in &action.clip.tracks {
                if let Some(sample) = track.sample(action.time) {
                    samples.push((track.target, sample));
                }
            }
        }
        if samples.is_empty() {
            return;
        }
        root.traverse_mut(&mut |node| {
            let Some(index) = node.get_index() else {
                return;
            };
            for (_, sample) in samples.iter().filter(|(target, _)| *target == index) {
                node.set_local_transform_with(&mut |local| match *sample {
                    Sample::Translation(position) => local.position = position,
                    Sample::Rotation(rotation) => local.rotation = rotation,
                    Sample::Scale(scale) => local.scale = scale,
                });
            }
        });
        root.update_world_transform_all();
    }
}
