use std::sync::Arc;

use glam::Vec3;
use log::info;
use strider::prelude::*;
use strider::{PropertyKind, SampledTransform};

const FPS: f32 = 30.0;

/// An in-place jump: the root bobs and slides forward while both feet rise
/// together between 0.3s and 0.7s.
fn jump_clip() -> (Arc<CurveGroupSet>, RestPose) {
    let keys = vec![0.0, 0.3, 0.5, 0.7, 1.0];

    let root = CurveGroup::new("Armature/root").with(PropertyCurves::translation(
        Some(ChannelCurve::linear(keys.clone(), vec![0.0, 0.02, 0.0, -0.02, 0.0])),
        Some(ChannelCurve::linear(keys.clone(), vec![1.0, 0.95, 1.2, 0.95, 1.0])),
        Some(ChannelCurve::linear(vec![0.0, 1.0], vec![0.0, 0.4])),
    ));
    let hips = CurveGroup::new("Armature/root/hips").with(PropertyCurves::rotation(
        None,
        Some(ChannelCurve::linear(keys.clone(), vec![0.0, 0.05, 0.0, -0.05, 0.0])),
        None,
        Some(ChannelCurve::constant(1.0)),
    ));
    let foot = |x: f32| {
        let side = if x < 0.0 { 'L' } else { 'R' };
        CurveGroup::new(format!("Armature/root/hips/foot_{side}")).with(
            PropertyCurves::translation(
                Some(ChannelCurve::constant(x)),
                Some(ChannelCurve::linear(keys.clone(), vec![-1.0, -1.0, -0.8, -1.0, -1.0])),
                None,
            ),
        )
    };

    let groups: CurveGroupSet = [root, hips, foot(-0.2), foot(0.2)].into_iter().collect();
    let at = |x: f32, y: f32| SampledTransform::from_translation(Vec3::new(x, y, 0.0));
    let rest = RestPose::from_local([
        ("Armature/root", at(0.0, 1.0)),
        ("Armature/root/hips", SampledTransform::IDENTITY),
        ("Armature/root/hips/foot_L", at(-0.2, -1.0)),
        ("Armature/root/hips/foot_R", at(0.2, -1.0)),
    ]);

    (Arc::new(groups), rest)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (groups, rest) = jump_clip();

    for anchor in [AnchorSpace::ExportRoot, AnchorSpace::RootParent] {
        let config = CorrectorConfig::enabled()
            .with_axes(true, true)
            .with_frame_rate(FPS)
            .with_anchor(anchor);
        let mut corrector = RootMotionCorrector::new(config);
        corrector.init(groups.clone(), &rest)?;

        let clip = corrector.clip("jump");
        let frame_count = clip.frame_count_for(groups.duration());
        let replaced = corrector.correct_clip(&clip, frame_count)?;

        let root = BonePath::new("Armature/root");
        let original = groups
            .property(root.as_str(), PropertyKind::Translation)
            .ok_or_else(|| anyhow::anyhow!("root translation missing"))?;
        let corrected = replaced
            .get(&root)
            .ok_or_else(|| anyhow::anyhow!("root translation was not corrected"))?;

        info!("{anchor:?}: baseline {:?}", corrector.baseline());
        for (i, sample) in corrected.iter().enumerate().step_by(5) {
            let before = original.sample_vec3(clip.frame_time(i));
            info!(
                "frame {i:>2}: {before:.3?} -> {sample:.3?} (removed {:.3?})",
                before - *sample
            );
        }
    }

    Ok(())
}
