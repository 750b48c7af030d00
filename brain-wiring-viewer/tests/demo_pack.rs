//! End-to-end checks over the bundled demo pack without a renderer:
//! manifest and payload decoding, session bookkeeping, placeholder
//! normalization, bundle planning and picking.

use bevy::ecs::system::SystemState;
use bevy::math::Affine3A;
use bevy::prelude::*;
use brain_wiring_viewer::engine::assets::bundle_payload::decode_bundle_payload;
use brain_wiring_viewer::engine::assets::pack_manifest::decode_manifest;
use brain_wiring_viewer::engine::core::params::ViewerParams;
use brain_wiring_viewer::engine::error::{FetchError, PackError};
use brain_wiring_viewer::engine::loading::fetcher::FetchRequest;
use brain_wiring_viewer::engine::loading::pack_session::{ManifestOutcome, PackSession};
use brain_wiring_viewer::engine::scene::anatomy::mesh_bounds;
use brain_wiring_viewer::engine::scene::composer::{BundlePlan, BundleStyle, SemanticLabel, plan_bundles};
use brain_wiring_viewer::engine::scene::lines::polyline_segments;
use brain_wiring_viewer::engine::scene::normalization::{NormalizationTransform, compute_normalization};
use brain_wiring_viewer::engine::scene::placeholder::brain_shell_mesh;
use brain_wiring_viewer::engine::systems::render_mode::RenderMode;
use brain_wiring_viewer::tools::picking::hit_test::{
    LineTolerance, PickCandidate, PickShape, nearest_hit, resolve_label,
};
use brain_wiring_viewer::tools::picking::ray::PickRay;
use constants::render_settings::THIN_LINE_THRESHOLD_PX;

const MANIFEST: &str = include_str!("../assets/packs/v0.1/manifest.json");
const AF: &str = include_str!("../assets/packs/v0.1/bundles/af.json");
const CST: &str = include_str!("../assets/packs/v0.1/bundles/cst.json");
const ROOT: &str = "packs/v0.1";

fn loaded_session() -> PackSession {
    let mut session = PackSession::default();
    let (generation, request) = session.begin("v0.1", ROOT);
    assert_eq!(
        request,
        FetchRequest::Manifest {
            path: "packs/v0.1/manifest.json".into()
        }
    );

    let manifest = decode_manifest(MANIFEST, "packs/v0.1/manifest.json").unwrap();
    let ManifestOutcome::Accepted { tag_changed, requests } =
        session.on_manifest(generation, Ok(manifest))
    else {
        panic!("demo manifest rejected");
    };
    assert!(tag_changed);
    assert_eq!(requests.len(), 2);

    for (id, text) in [("AF", AF), ("CST", CST)] {
        let payload = decode_bundle_payload(text, id).unwrap();
        assert!(session.on_bundle_payload(generation, id, Ok(payload)));
    }
    session
}

fn placeholder_normalization() -> NormalizationTransform {
    let bounds = mesh_bounds(&brain_shell_mesh()).unwrap();
    compute_normalization(&bounds)
}

fn demo_plans(session: &PackSession, normalization: &NormalizationTransform) -> Vec<BundlePlan> {
    let manifest = session.manifest().unwrap();
    let params = ViewerParams::for_pack("v0.1").with_enabled_bundles(manifest.bundle_ids());
    let style = BundleStyle::from_params(&params, THIN_LINE_THRESHOLD_PX);
    plan_bundles(
        manifest,
        session.payloads(),
        &params.enabled_bundles,
        session.loaded_root(),
        &style,
        normalization,
    )
}

fn root_affine(normalization: &NormalizationTransform) -> Affine3A {
    let mut transform = Transform::IDENTITY;
    normalization.apply(&mut transform);
    transform.compute_affine()
}

#[test]
fn demo_pack_status_reports_placeholder() {
    let session = loaded_session();
    let status = session.status_text();
    assert!(status.contains("2 bundles"), "{status}");
    assert!(status.contains("no anatomy"), "{status}");
    assert!(session.failed_payloads().is_empty());
}

#[test]
fn demo_wiring_lands_inside_normalized_frame() {
    let session = loaded_session();
    let normalization = placeholder_normalization();
    let plans = demo_plans(&session, &normalization);

    assert_eq!(plans.len(), 2);
    for plan in &plans {
        assert!(plan.issues.is_empty(), "{}: {:?}", plan.id, plan.issues);
        assert!(plan.visible_wiring_primitives(RenderMode::Wiring) > 0);
        assert_eq!(plan.visible_wiring_primitives(RenderMode::Surface), 0);
        for point in plan.wiring.iter().flatten() {
            let display = normalization.to_display(*point);
            assert!(display.abs().max_element() <= 0.5 + 1e-3, "{} at {display}", plan.id);
        }
    }
}

#[test]
fn pointer_over_arcuate_line_reports_bundle_name() {
    let session = loaded_session();
    let normalization = placeholder_normalization();
    let plans = demo_plans(&session, &normalization);
    let affine = root_affine(&normalization);

    // Group -> wiring -> line, labelled only at the group.
    let mut world = World::new();
    let mut shapes = Vec::new();
    for plan in &plans {
        let group = world.spawn(SemanticLabel(plan.name.clone())).id();
        let wiring = world.spawn(ChildOf(group)).id();
        for polyline in &plan.wiring {
            let line = world.spawn(ChildOf(wiring)).id();
            shapes.push((line, PickShape::Segments(polyline_segments(polyline))));
        }
    }

    let af = plans.iter().find(|p| p.id == "AF").unwrap();
    let target = affine.transform_point3(af.wiring[0][5]);
    let ray = PickRay {
        origin: target + Vec3::Z * 3.0,
        direction: Vec3::NEG_Z,
    };
    let tolerance = LineTolerance::orthographic(6.0, 0.6, 600.0);
    let candidates = || {
        shapes.iter().map(|(entity, shape)| PickCandidate {
            entity: *entity,
            shape,
            world_from_local: affine,
            mesh: None,
        })
    };

    let hit = nearest_hit(&ray, candidates(), &tolerance).unwrap();
    let mut state: SystemState<(Query<&SemanticLabel>, Query<&ChildOf>)> = SystemState::new(&mut world);
    let (labels, parents) = state.get(&world);
    assert_eq!(
        resolve_label(hit.entity, &labels, &parents).as_deref(),
        Some("Arcuate fasciculus")
    );

    let miss = PickRay {
        origin: Vec3::new(5.0, 5.0, 5.0),
        direction: Vec3::Y,
    };
    assert!(nearest_hit(&miss, candidates(), &tolerance).is_none());
}

#[test]
fn reload_failure_keeps_demo_content() {
    let mut session = loaded_session();
    let (generation, _) = session.begin("v9.9", "packs/v9.9");
    let failure = PackError::Fetch(FetchError::Status {
        url: "packs/v9.9/manifest.json".into(),
        status: 404,
    });
    assert!(matches!(session.on_manifest(generation, Err(failure)), ManifestOutcome::Failed(_)));

    assert_eq!(session.manifest().map(|m| m.bundles.len()), Some(2));
    assert_eq!(session.payloads().len(), 2);
    assert!(session.status_text().contains("Still showing v0.1"));
}
