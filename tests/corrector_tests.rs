//! Root motion corrector tests
//!
//! Tests for:
//! - Axis masking and baseline neutrality, including offset ancestors
//! - Graceful degradation on incomplete skeletons
//! - Jump / sway scenarios in both anchor spaces
//! - Feet carried by animated ancestors
//! - Re-expression of the corrected point through rotated ancestors
//! - Property dispatch and contract errors

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{Quat, Vec3};
use strider::animation::{compose_up, sample_local};
use strider::prelude::*;
use strider::{PropertyKind, SampledTransform};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-4;
const FPS: f32 = 30.0;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn linear(times: &[f32], values: &[f32]) -> Option<ChannelCurve> {
    Some(ChannelCurve::linear(times.to_vec(), values.to_vec()))
}

fn constant(value: f32) -> Option<ChannelCurve> {
    Some(ChannelCurve::constant(value))
}

/// `root → hips → foot_L, foot_R`, feet resting at ±0.2 on X relative to hips.
///
/// The root walks forward along +Z at 1 unit/s. Both feet rise together to
/// y = 0.1 by frame 5 (a jump) and stay there.
struct JumpRig {
    groups: Arc<CurveGroupSet>,
    rest: RestPose,
    root: String,
}

impl JumpRig {
    fn new(prefix: &str) -> Self {
        Self::build(prefix, None)
    }

    /// The same rig below an unanimated, rest-posed `Armature` node.
    fn under_armature(armature: SampledTransform) -> Self {
        Self::build("Armature/", Some(armature))
    }

    fn build(prefix: &str, armature: Option<SampledTransform>) -> Self {
        let path = |p: &str| format!("{prefix}{p}");
        let jump_time = 5.0 / FPS;

        let root = CurveGroup::new(path("root")).with(PropertyCurves::translation(
            constant(0.0),
            constant(0.0),
            linear(&[0.0, 1.0], &[0.0, 1.0]),
        ));
        let hips = CurveGroup::new(path("root/hips"))
            .with(PropertyCurves::rotation(None, None, None, constant(1.0)));
        let foot = |x: f32| {
            PropertyCurves::translation(
                constant(x),
                linear(&[0.0, jump_time, 1.0], &[0.0, 0.1, 0.1]),
                constant(0.0),
            )
        };
        let left = CurveGroup::new(path("root/hips/foot_L")).with(foot(-0.2));
        let right = CurveGroup::new(path("root/hips/foot_R")).with(foot(0.2));

        let mut locals = vec![
            (path("root"), SampledTransform::IDENTITY),
            (path("root/hips"), SampledTransform::IDENTITY),
            (path("root/hips/foot_L"), SampledTransform::from_translation(-0.2 * Vec3::X)),
            (path("root/hips/foot_R"), SampledTransform::from_translation(0.2 * Vec3::X)),
        ];
        if let Some(armature) = armature {
            locals.push(("Armature".to_string(), armature));
        }

        Self {
            groups: Arc::new([root, hips, left, right].into_iter().collect()),
            rest: RestPose::from_local(locals),
            root: path("root"),
        }
    }

    fn corrector(&self, config: CorrectorConfig) -> RootMotionCorrector {
        let mut corrector = RootMotionCorrector::new(config.with_frame_rate(FPS));
        corrector
            .init(self.groups.clone(), &self.rest)
            .expect("jump rig is a valid skeleton");
        corrector
    }

    fn root_translation(&self, root: &str) -> &PropertyCurves {
        self.groups.property(root, PropertyKind::Translation).unwrap()
    }

    fn correct(&self, config: CorrectorConfig, frames: usize) -> (Vec<Vec3>, Vec<Vec3>) {
        let corrector = self.corrector(config);
        let clip = corrector.clip("jump");
        let curves = self.root_translation(&self.root);
        let corrected = corrector
            .apply(&clip, "translation", curves, frames, &self.root)
            .unwrap();
        let original = (0..frames)
            .map(|i| curves.sample_vec3(clip.frame_time(i)))
            .collect();
        (corrected.samples().unwrap().to_vec(), original)
    }
}

// ============================================================================
// Masking & Baseline
// ============================================================================

#[test]
fn disabled_axes_reproduce_input_exactly() {
    let rig = JumpRig::new("");
    let (corrected, original) = rig.correct(CorrectorConfig::enabled().with_axes(false, false), 30);
    assert_eq!(corrected, original);
}

#[test]
fn reference_frame_is_not_corrected() {
    let rig = JumpRig::new("");
    let corrector = rig.corrector(CorrectorConfig::enabled().with_axes(true, true));
    assert_eq!(corrector.baseline(), Some(Vec3::ZERO));

    let (corrected, original) = rig.correct(CorrectorConfig::enabled().with_axes(true, true), 1);
    assert_eq!(corrected[0], original[0]);
}

#[test]
fn reference_frame_is_not_corrected_under_offset_armature() {
    // Blender-style export node: lifted, Z-up to Y-up, centimetres to metres
    let rig = JumpRig::under_armature(SampledTransform {
        translation: Vec3::new(0.0, 1.0, 0.0),
        rotation: Quat::from_rotation_x(-FRAC_PI_2),
        scale: Vec3::splat(0.01),
    });

    for anchor in [AnchorSpace::ExportRoot, AnchorSpace::RootParent] {
        let config = CorrectorConfig::enabled()
            .with_axes(true, true)
            .with_anchor(anchor);
        let (corrected, original) = rig.correct(config, 1);
        assert!(
            vec3_approx(corrected[0], original[0]),
            "{anchor:?}: {:?} vs {:?}",
            corrected[0],
            original[0]
        );
    }
}

#[test]
fn zero_frames_yield_empty_output() {
    let rig = JumpRig::new("");
    let (corrected, _) = rig.correct(CorrectorConfig::enabled(), 0);
    assert!(corrected.is_empty());
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn jump_is_removed_from_root_height() {
    let rig = JumpRig::new("");
    let (corrected, original) = rig.correct(CorrectorConfig::enabled().with_axes(true, false), 10);

    assert!(vec3_approx(corrected[5], original[5] - Vec3::new(0.0, 0.1, 0.0)));
    // Horizontal drift is left alone
    assert!((corrected[5].z - original[5].z).abs() < EPSILON);
}

#[test]
fn jump_is_removed_in_root_parent_space() {
    let rig = JumpRig::new("");
    let config = CorrectorConfig::enabled()
        .with_axes(true, false)
        .with_anchor(AnchorSpace::RootParent);
    let (corrected, original) = rig.correct(config, 10);

    assert!(vec3_approx(corrected[5], original[5] - Vec3::new(0.0, 0.1, 0.0)));
}

#[test]
fn tiny_armature_scale_still_anchors_at_root_parent() {
    let rig = JumpRig::under_armature(SampledTransform {
        scale: Vec3::splat(0.004),
        ..SampledTransform::IDENTITY
    });
    let config = CorrectorConfig::enabled()
        .with_axes(true, false)
        .with_anchor(AnchorSpace::RootParent);
    let (corrected, original) = rig.correct(config, 10);

    assert!(vec3_approx(corrected[5], original[5] - Vec3::new(0.0, 0.1, 0.0)));
}

#[test]
fn hips_jump_carries_rotation_only_feet() {
    let jump_time = 5.0 / FPS;
    let root = CurveGroup::new("root").with(PropertyCurves::translation(
        constant(0.0),
        constant(1.0),
        constant(0.0),
    ));
    let hips = CurveGroup::new("root/hips").with(PropertyCurves::translation(
        None,
        linear(&[0.0, jump_time, 1.0], &[0.0, 0.1, 0.1]),
        None,
    ));
    let ankle_roll = || {
        PropertyCurves::rotation(None, None, linear(&[0.0, 1.0], &[0.0, 0.2]), constant(1.0))
    };
    let groups: Arc<CurveGroupSet> = Arc::new(
        [
            root,
            hips,
            CurveGroup::new("root/hips/foot_L").with(ankle_roll()),
            CurveGroup::new("root/hips/foot_R").with(ankle_roll()),
        ]
        .into_iter()
        .collect(),
    );
    let rest = RestPose::from_local([
        ("root", SampledTransform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
        ("root/hips", SampledTransform::IDENTITY),
        ("root/hips/foot_L", SampledTransform::from_translation(Vec3::new(-0.2, -1.0, 0.0))),
        ("root/hips/foot_R", SampledTransform::from_translation(Vec3::new(0.2, -1.0, 0.0))),
    ]);

    for anchor in [AnchorSpace::ExportRoot, AnchorSpace::RootParent] {
        let config = CorrectorConfig::enabled()
            .with_axes(true, false)
            .with_frame_rate(FPS)
            .with_anchor(anchor);
        let mut corrector = RootMotionCorrector::new(config);
        corrector.init(groups.clone(), &rest).unwrap();

        let clip = corrector.clip("hop");
        let curves = groups.property("root", PropertyKind::Translation).unwrap();
        let out = corrector.apply(&clip, "translation", curves, 10, "root").unwrap();
        let samples = out.samples().unwrap();
        assert!(vec3_approx(samples[0], Vec3::new(0.0, 1.0, 0.0)), "{anchor:?}");
        assert!(
            vec3_approx(samples[5], Vec3::new(0.0, 0.9, 0.0)),
            "{anchor:?}: {:?}",
            samples[5]
        );
    }
}

#[test]
fn horizontal_drift_is_cancelled() {
    // Feet carried forward by the root: cancelling the midpoint drift pins the root in place
    let rig = JumpRig::new("");
    let (corrected, _) = rig.correct(CorrectorConfig::enabled().with_axes(false, true), 31);

    for (i, sample) in corrected.iter().enumerate() {
        assert!(vec3_approx(*sample, Vec3::ZERO), "frame {i}: {sample:?}");
    }
}

#[test]
fn corrected_point_is_reexpressed_through_rotated_ancestors() {
    let mut rest = RestPose::new();
    let armature = SampledTransform {
        translation: Vec3::new(1.0, 0.0, 0.0),
        rotation: Quat::from_rotation_y(0.7),
        scale: Vec3::splat(2.0),
    };
    rest.insert("Armature", armature.to_affine());
    rest.insert_position("Armature/root", armature.to_affine().transform_point3(Vec3::ZERO));
    rest.insert_position("Armature/foot_L", Vec3::new(-0.2, 0.0, 0.0));
    rest.insert_position("Armature/foot_R", Vec3::new(0.2, 0.0, 0.0));

    let armature_group = CurveGroup::new("Armature")
        .with(PropertyCurves::translation(constant(1.0), None, None))
        .with(PropertyCurves::rotation(
            None,
            constant(armature.rotation.y),
            None,
            constant(armature.rotation.w),
        ))
        .with(PropertyCurves::scale(constant(2.0), constant(2.0), constant(2.0)));
    let root = CurveGroup::new("Armature/root")
        .with(PropertyCurves::translation(linear(&[0.0, 1.0], &[0.0, 0.5]), constant(0.0), None));
    // Feet sway sideways in export-root space, independent of the root
    let sway = |x: f32| {
        PropertyCurves::translation(linear(&[0.0, 1.0], &[x, x + 0.3]), None, None)
    };
    let groups: Arc<CurveGroupSet> = Arc::new(
        [
            armature_group,
            root,
            CurveGroup::new("Armature/foot_L").with(sway(-0.2)),
            CurveGroup::new("Armature/foot_R").with(sway(0.2)),
        ]
        .into_iter()
        .collect(),
    );

    let mut corrector = RootMotionCorrector::new(CorrectorConfig::enabled().with_axes(true, true));
    corrector.init(groups.clone(), &rest).unwrap();
    let clip = ClipInfo::new("sway", 10.0);
    let curves = groups.property("Armature/root", PropertyKind::Translation).unwrap();
    let corrected = corrector
        .apply(&clip, "translation", curves, 11, "Armature/root")
        .unwrap();
    let samples = corrected.samples().unwrap();

    let armature_group = groups.get("Armature").unwrap();
    for (i, sample) in samples.iter().enumerate() {
        let time = clip.frame_time(i);
        let parent = [sample_local(armature_group, time)];
        let foot_mid = (compose_up(Vec3::new(-0.2 + 0.3 * time, 0.0, 0.0), &parent)
            + compose_up(Vec3::new(0.2 + 0.3 * time, 0.0, 0.0), &parent))
            * 0.5;
        let offset = foot_mid - corrector.baseline().unwrap();
        let expected_world = compose_up(curves.sample_vec3(time), &parent) - offset;
        assert!(
            vec3_approx(compose_up(*sample, &parent), expected_world),
            "frame {i}"
        );
    }
}

#[test]
fn nested_export_root_paths_resolve_by_name() {
    let rig = JumpRig::new("Character/Armature/");
    let corrector = rig.corrector(CorrectorConfig::enabled().with_axes(true, false));
    assert_eq!(
        corrector.root_path(),
        Some(&BonePath::new("Character/Armature/root"))
    );

    let clip = corrector.clip("jump");
    let replaced = corrector.correct_clip(&clip, 10).unwrap();
    assert_eq!(replaced.len(), 1);
    let samples = &replaced[&BonePath::new("Character/Armature/root")];
    assert!((samples[5].y + 0.1).abs() < EPSILON);
}

// ============================================================================
// Graceful Degradation
// ============================================================================

#[test]
fn missing_root_leaves_corrector_passthrough() {
    let rig = JumpRig::new("");
    let config = CorrectorConfig::enabled().with_root_bone("pelvis");
    let mut corrector = RootMotionCorrector::new(config);
    let err = corrector.init(rig.groups.clone(), &rig.rest).unwrap_err();
    assert!(err.is_recoverable());
    assert!(!corrector.is_ready());

    let clip = corrector.clip("jump");
    let curves = rig.root_translation("root");
    for property in ["translation", "rotation", "scale", "weights"] {
        let out = corrector.apply(&clip, property, curves, 10, "root").unwrap();
        assert!(out.is_passthrough(), "{property}");
    }
    assert!(corrector.correct_clip(&clip, 10).unwrap().is_empty());
}

#[test]
fn feet_outside_root_fail_parent_space_init() {
    let mut rest = RestPose::new();
    rest.insert_position("Armature/root", Vec3::ZERO);
    rest.insert_position("Armature/foot_L", Vec3::new(-0.2, 0.0, 0.0));
    rest.insert_position("Armature/foot_R", Vec3::new(0.2, 0.0, 0.0));
    let groups = Arc::new(CurveGroupSet::new());

    let mut world = RootMotionCorrector::new(CorrectorConfig::enabled());
    assert!(world.init(groups.clone(), &rest).is_ok());

    let mut local =
        RootMotionCorrector::new(CorrectorConfig::enabled().with_anchor(AnchorSpace::RootParent));
    let err = local.init(groups, &rest).unwrap_err();
    assert!(matches!(err, CorrectionError::OutsideAnchor { .. }));
    assert!(!local.is_ready());
}

#[test]
fn custom_foot_names() {
    let mut rest = RestPose::new();
    rest.insert_position("root", Vec3::ZERO);
    rest.insert_position("root/LeftFoot", Vec3::new(-0.2, 0.0, 0.0));
    rest.insert_position("root/RightFoot", Vec3::new(0.2, 0.0, 0.0));

    let mut corrector = RootMotionCorrector::new(CorrectorConfig::enabled());
    assert!(corrector.init(Arc::new(CurveGroupSet::new()), &rest).is_err());

    let mut corrector =
        RootMotionCorrector::new(CorrectorConfig::enabled().with_feet("LeftFoot", "RightFoot"));
    corrector.init(Arc::new(CurveGroupSet::new()), &rest).unwrap();
    assert!(corrector.is_ready());
}

// ============================================================================
// Property Dispatch
// ============================================================================

#[test]
fn only_root_translation_is_replaced() {
    let rig = JumpRig::new("");
    let corrector = rig.corrector(CorrectorConfig::enabled());
    let clip = corrector.clip("jump");
    let translation = rig.root_translation("root");
    let rotation = rig.groups.property("root/hips", PropertyKind::Rotation).unwrap();

    let hips = corrector.apply(&clip, "translation", translation, 5, "root/hips").unwrap();
    assert!(hips.is_passthrough());
    let rot = corrector.apply(&clip, "rotation", rotation, 5, "root").unwrap();
    assert!(rot.is_passthrough());
    let scale = corrector.apply(&clip, "scale", translation, 5, "root").unwrap();
    assert!(scale.is_passthrough());
    let moved = corrector.apply(&clip, "translation", translation, 5, "root").unwrap();
    assert_eq!(moved.samples().map(<[Vec3]>::len), Some(5));
}

#[test]
fn unknown_property_is_a_contract_error() {
    let rig = JumpRig::new("");
    let corrector = rig.corrector(CorrectorConfig::enabled());
    let clip = corrector.clip("jump");
    let curves = rig.root_translation("root");

    let err = corrector.apply(&clip, "weights", curves, 5, "root").unwrap_err();
    assert_eq!(err, CorrectionError::UnsupportedProperty("weights".into()));
    assert!(!err.is_recoverable());

    let err = corrector.apply(&clip, "euler_angles", curves, 5, "root").unwrap_err();
    assert!(matches!(err, CorrectionError::EulerAnglesUnsupported(_)));

    let rotation = rig.groups.property("root/hips", PropertyKind::Rotation).unwrap();
    let err = corrector.apply(&clip, "translation", rotation, 5, "root").unwrap_err();
    assert!(matches!(err, CorrectionError::PropertyMismatch { .. }));
}

#[test]
fn independent_correctors_run_in_parallel() {
    let results: Vec<Vec<Vec3>> = std::thread::scope(|scope| {
        let handles: Vec<_> = [true, false]
            .into_iter()
            .map(|vertical| {
                scope.spawn(move || {
                    let rig = JumpRig::new("");
                    rig.correct(CorrectorConfig::enabled().with_axes(vertical, false), 10).0
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!((results[0][5].y + 0.1).abs() < EPSILON);
    assert!(results[1][5].y.abs() < EPSILON);
}
