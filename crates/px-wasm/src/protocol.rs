//! JSON shapes exchanged with the browser.
//!
//! Everything here is plain Rust so it can be tested off-wasm; `lib.rs` only
//! converts the errors into `JsValue`s.

use px_core::filters::{ADJUST_FILTERS, AdjustKind, AdjustValues};
use px_core::model::{Color, FontStyle, FontWeight, Geometry, TextAlign};
use px_core::presets::{CropRatio, RetouchPreset};
use px_core::viewport::ViewportLayout;
use px_editor::session::{ExportPlan, PendingReset, PendingTransform};
use px_editor::shortcuts::ShortcutAction;
use px_editor::tools::CropSession;
use px_editor::tools::resize::ResizeDraft;
use px_editor::tools::text::TextToggle;
use px_editor::{
    Canvas, ExtendAmount, ExtendDirection, Notice, SaveReason, SaveRequest, TextEdit, TransformOp,
};
use std::collections::BTreeMap;
use serde::Deserialize;
use serde_json::{Value, json};

// ─── Requests from JS ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OpSpec {
    Extend { direction: String, amount: Option<u32> },
    RemoveBackground,
    Retouch { preset: String },
    BackgroundImage { url: String },
    BackgroundColor { color: String },
}

/// Parse `{"kind":"extend","direction":"left","amount":200}` and friends.
pub fn parse_op(json: &str) -> Result<TransformOp, String> {
    let spec: OpSpec = serde_json::from_str(json).map_err(|e| format!("invalid transform: {e}"))?;
    Ok(match spec {
        OpSpec::Extend { direction, amount } => TransformOp::Extend {
            direction: ExtendDirection::from_key(&direction)
                .ok_or_else(|| format!("unknown direction '{direction}'"))?,
            amount: match amount {
                Some(px) => ExtendAmount::new(px).map_err(|e| e.to_string())?,
                None => ExtendAmount::default(),
            },
        },
        OpSpec::RemoveBackground => TransformOp::RemoveBackground,
        OpSpec::Retouch { preset } => TransformOp::Retouch(
            RetouchPreset::from_key(&preset).ok_or_else(|| format!("unknown preset '{preset}'"))?,
        ),
        OpSpec::BackgroundImage { url } => TransformOp::BackgroundImage { url },
        OpSpec::BackgroundColor { color } => TransformOp::BackgroundColor(parse_color(&color)?),
    })
}

pub fn parse_color(hex: &str) -> Result<Color, String> {
    Color::from_hex(hex).ok_or_else(|| format!("invalid color '{hex}'"))
}

/// One text property edit, keyed the way the properties panel names them.
pub fn parse_text_edit(key: &str, value: &str) -> Result<TextEdit, String> {
    match key {
        "content" => Ok(TextEdit::Content(value.to_string())),
        "fontFamily" => Ok(TextEdit::FontFamily(value.to_string())),
        "fontSize" => value
            .parse::<f64>()
            .map(TextEdit::FontSize)
            .map_err(|_| format!("invalid font size '{value}'")),
        "fill" => parse_color(value).map(TextEdit::Fill),
        "align" => lowercase_enum::<TextAlign>(value).map(TextEdit::Align),
        "weight" => lowercase_enum::<FontWeight>(value).map(TextEdit::Weight),
        "style" => lowercase_enum::<FontStyle>(value).map(TextEdit::Style),
        "underline" => Ok(TextEdit::Underline(value == "true")),
        _ => Err(format!("unknown text property '{key}'")),
    }
}

fn lowercase_enum<T: for<'de> Deserialize<'de>>(value: &str) -> Result<T, String> {
    serde_json::from_value(Value::String(value.to_string()))
        .map_err(|_| format!("invalid value '{value}'"))
}

pub fn parse_toggle(name: &str) -> Option<TextToggle> {
    match name {
        "bold" => Some(TextToggle::Bold),
        "italic" => Some(TextToggle::Italic),
        "underline" => Some(TextToggle::Underline),
        _ => None,
    }
}

pub fn parse_crop_ratio(name: &str) -> Option<CropRatio> {
    CropRatio::ALL
        .into_iter()
        .find(|r| r.label().eq_ignore_ascii_case(name))
}

/// `{"left":10,"top":20,"scale_x":0.5,...}`; omitted scale defaults to 1.
pub fn parse_geometry(json: &str) -> Result<Geometry, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid geometry: {e}"))
}

/// Slider values keyed by filter, e.g. `{"brightness":20,"hue":-45}`.
/// Missing sliders sit at their default; values are clamped to range.
pub fn parse_adjustments(json: &str) -> Result<AdjustValues, String> {
    let sliders: BTreeMap<String, f64> =
        serde_json::from_str(json).map_err(|e| format!("invalid adjustments: {e}"))?;
    let mut values = AdjustValues::default();
    for (key, value) in sliders {
        let kind = AdjustKind::from_key(&key).ok_or_else(|| format!("unknown adjustment '{key}'"))?;
        values.set(kind, value);
    }
    Ok(values)
}

// ─── Responses to JS ─────────────────────────────────────────────────────

pub fn transform_json(pending: Option<&PendingTransform>) -> String {
    match pending {
        Some(p) => json!({ "ticket": p.ticket, "url": p.request.url }).to_string(),
        None => "null".to_string(),
    }
}

pub fn reset_json(pending: Option<&PendingReset>) -> String {
    match pending {
        Some(p) => json!({ "ticket": p.ticket, "url": p.url }).to_string(),
        None => "null".to_string(),
    }
}

pub fn notices_json(notices: &[Notice]) -> String {
    let items: Vec<Value> = notices
        .iter()
        .map(|n| match n {
            Notice::Error(m) => json!({ "kind": "error", "message": m }),
            Notice::Success(m) => json!({ "kind": "success", "message": m }),
            Notice::Upsell(m) => json!({ "kind": "upsell", "message": m }),
        })
        .collect();
    Value::Array(items).to_string()
}

fn reason_name(reason: SaveReason) -> &'static str {
    match reason {
        SaveReason::Autosave => "autosave",
        SaveReason::Manual => "manual",
        SaveReason::Resize => "resize",
        SaveReason::Transform => "transform",
        SaveReason::Reset => "reset",
    }
}

pub fn saves_json(requests: &[SaveRequest]) -> String {
    let items: Vec<Value> = requests
        .iter()
        .map(|r| {
            json!({
                "ticket": r.ticket,
                "projectId": r.project_id,
                "reason": reason_name(r.reason),
                "patch": r.patch,
            })
        })
        .collect();
    Value::Array(items).to_string()
}

pub fn layout_json(layout: &ViewportLayout) -> String {
    json!({
        "fitScale": layout.fit_scale,
        "zoom": layout.zoom,
        "panX": layout.pan_x,
        "panY": layout.pan_y,
        "displayWidth": layout.display.width,
        "displayHeight": layout.display.height,
        "backingWidth": layout.backing_width,
        "backingHeight": layout.backing_height,
    })
    .to_string()
}

pub fn export_json(plan: Option<&ExportPlan>) -> String {
    match plan {
        Some(p) => json!({
            "mime": p.format.mime(),
            "quality": p.quality,
            "width": p.width,
            "height": p.height,
            "fileName": p.file_name,
        })
        .to_string(),
        None => "null".to_string(),
    }
}

/// The crop overlay as the host draws it, or `null` outside crop mode.
pub fn crop_json(session: Option<&CropSession>, canvas: &Canvas) -> String {
    let Some(session) = session else {
        return "null".to_string();
    };
    let Some(overlay) = canvas.get(session.overlay) else {
        return "null".to_string();
    };
    let bounds = overlay.bounding_rect();
    json!({
        "target": session.target.as_str(),
        "overlay": session.overlay.as_str(),
        "ratio": session.ratio.label(),
        "geometry": overlay.geometry,
        "left": bounds.x0,
        "top": bounds.y0,
        "width": bounds.width(),
        "height": bounds.height(),
    })
    .to_string()
}

/// Every slider with its range and current value, in panel order.
pub fn adjustments_json(values: &AdjustValues) -> String {
    let items: Vec<Value> = ADJUST_FILTERS
        .iter()
        .map(|spec| {
            let value = values.get(spec.kind);
            json!({
                "key": spec.key,
                "label": spec.label,
                "value": value,
                "display": spec.format(value),
                "min": spec.min,
                "max": spec.max,
                "step": spec.step,
            })
        })
        .collect();
    Value::Array(items).to_string()
}

pub fn resize_draft_json(draft: &ResizeDraft) -> String {
    json!({
        "width": draft.width,
        "height": draft.height,
        "lockAspect": draft.lock_aspect,
        "preset": draft.preset,
        "changed": draft.is_changed(),
    })
    .to_string()
}

pub fn action_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Tool(_) => "tool",
        ShortcutAction::Undo => "undo",
        ShortcutAction::Redo => "redo",
        ShortcutAction::Delete => "delete",
        ShortcutAction::Save => "save",
        ShortcutAction::Nudge { .. } => "nudge",
        ShortcutAction::Confirm => "confirm",
        ShortcutAction::Cancel => "cancel",
        ShortcutAction::ZoomIn => "zoomIn",
        ShortcutAction::ZoomOut => "zoomOut",
        ShortcutAction::ZoomToFit => "zoomToFit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use px_editor::{AssetInfo, EditorConfig, EditorSession, PlanEntitlements, Project, ProjectPatch};

    #[test]
    fn extend_defaults_amount() {
        let op = parse_op(r#"{"kind":"extend","direction":"top"}"#).unwrap();
        assert_eq!(
            op,
            TransformOp::Extend {
                direction: ExtendDirection::Top,
                amount: ExtendAmount::default(),
            }
        );
    }

    #[test]
    fn invalid_ops_are_rejected() {
        assert!(parse_op(r#"{"kind":"extend","direction":"up"}"#).is_err());
        assert!(parse_op(r#"{"kind":"extend","direction":"left","amount":60}"#).is_err());
        assert!(parse_op(r#"{"kind":"retouch","preset":"magic"}"#).is_err());
        assert!(parse_op(r#"{"kind":"teleport"}"#).is_err());
    }

    #[test]
    fn retouch_and_color_ops() {
        assert_eq!(
            parse_op(r#"{"kind":"retouch","preset":"ai_upscale"}"#).unwrap(),
            TransformOp::Retouch(RetouchPreset::AiUpscale)
        );
        assert_eq!(
            parse_op(r##"{"kind":"background_color","color":"#FF0000"}"##).unwrap(),
            TransformOp::BackgroundColor(Color::from_hex("#FF0000").unwrap())
        );
    }

    #[test]
    fn text_properties() {
        assert_eq!(parse_text_edit("fontSize", "32").unwrap(), TextEdit::FontSize(32.0));
        assert_eq!(
            parse_text_edit("align", "center").unwrap(),
            TextEdit::Align(TextAlign::Center)
        );
        assert_eq!(
            parse_text_edit("weight", "bold").unwrap(),
            TextEdit::Weight(FontWeight::Bold)
        );
        assert!(parse_text_edit("fontSize", "huge").is_err());
        assert!(parse_text_edit("kerning", "1").is_err());
    }

    #[test]
    fn crop_ratio_names_ignore_case() {
        assert_eq!(parse_crop_ratio("square"), Some(CropRatio::Square));
        assert_eq!(parse_crop_ratio("Story"), Some(CropRatio::Story));
        assert_eq!(parse_crop_ratio("panorama"), None);
    }

    #[test]
    fn notices_carry_their_kind() {
        let json = notices_json(&[
            Notice::Success("saved".into()),
            Notice::Upsell("upgrade".into()),
        ]);
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed,
            json!([
                { "kind": "success", "message": "saved" },
                { "kind": "upsell", "message": "upgrade" },
            ])
        );
    }

    #[test]
    fn saves_expose_patch_fields() {
        let request = SaveRequest {
            ticket: 4,
            project_id: "p1".into(),
            patch: ProjectPatch {
                width: Some(1200),
                ..ProjectPatch::default()
            },
            reason: SaveReason::Resize,
        };
        let parsed: Value = serde_json::from_str(&saves_json(&[request])).unwrap();
        assert_eq!(
            parsed,
            json!([{ "ticket": 4, "projectId": "p1", "reason": "resize", "patch": { "width": 1200 } }])
        );
    }

    fn cropping_session() -> EditorSession {
        let project: Project = serde_json::from_value(json!({
            "id": "p1",
            "title": "Dunes",
            "width": 800,
            "height": 600,
            "originalImageUrl": "https://ik.imagekit.io/px/dunes.jpg",
        }))
        .unwrap();
        let mut session =
            EditorSession::open(project, EditorConfig::default(), PlanEntitlements::default())
                .unwrap();
        let url = session.initial_asset_url().unwrap().to_string();
        session
            .place_initial_image(&AssetInfo::new(url, 1600, 1200))
            .unwrap();
        assert!(session.enter_crop(None).unwrap());
        session
    }

    #[test]
    fn crop_overlay_reports_ids_and_bounds() {
        let mut session = cropping_session();
        let crop = session.context().tool_mode.crop().cloned().unwrap();
        let parsed: Value =
            serde_json::from_str(&crop_json(Some(&crop), session.canvas())).unwrap();
        assert_eq!(parsed["target"], crop.target.as_str());
        assert_eq!(parsed["overlay"], crop.overlay.as_str());
        assert_eq!(parsed["ratio"], "Freeform");
        assert!(parsed["width"].as_f64().unwrap() > 0.0);
        assert!(parsed["geometry"]["scale_x"].is_number());

        session.set_crop_ratio(CropRatio::Square).unwrap();
        let crop = session.context().tool_mode.crop().cloned().unwrap();
        let parsed: Value =
            serde_json::from_str(&crop_json(Some(&crop), session.canvas())).unwrap();
        assert_eq!(parsed["ratio"], "Square");
        let (w, h) = (parsed["width"].as_f64().unwrap(), parsed["height"].as_f64().unwrap());
        assert!((w - h).abs() < 1e-6);
        assert_eq!(crop_json(None, session.canvas()), "null");
    }

    #[test]
    fn adjustments_parse_and_clamp() {
        let values = parse_adjustments(r#"{"brightness":20,"hue":-500}"#).unwrap();
        assert_eq!(values.get(AdjustKind::Brightness), 20.0);
        assert_eq!(values.get(AdjustKind::Hue), -180.0);
        assert_eq!(values.get(AdjustKind::Blur), 0.0);
        assert!(parse_adjustments(r#"{"sepia":10}"#).is_err());
        assert!(parse_adjustments("[1,2]").is_err());
    }

    #[test]
    fn adjustments_list_every_slider() {
        let mut values = AdjustValues::default();
        values.set(AdjustKind::Hue, 45.0);
        let parsed: Value = serde_json::from_str(&adjustments_json(&values)).unwrap();
        let sliders = parsed.as_array().unwrap();
        assert_eq!(sliders.len(), ADJUST_FILTERS.len());
        assert_eq!(
            sliders[5],
            json!({
                "key": "hue",
                "label": "Hue",
                "value": 45.0,
                "display": "45°",
                "min": -180.0,
                "max": 180.0,
                "step": 1.0,
            })
        );
    }

    #[test]
    fn geometry_fills_defaults() {
        let geometry = parse_geometry(r#"{"left":12,"top":-4,"angle":90}"#).unwrap();
        assert_eq!(geometry.scale_x, 1.0);
        assert_eq!(geometry.angle, 90.0);
        assert!(parse_geometry(r#"{"left":"x"}"#).is_err());
    }

    #[test]
    fn resize_draft_tracks_changes() {
        let mut draft = ResizeDraft::new(800, 600);
        draft.apply_preset("Instagram Post").unwrap();
        let parsed: Value = serde_json::from_str(&resize_draft_json(&draft)).unwrap();
        assert_eq!(
            parsed,
            json!({
                "width": 693,
                "height": 693,
                "lockAspect": true,
                "preset": "Instagram Post",
                "changed": true,
            })
        );
    }

    #[test]
    fn nothing_pending_is_null() {
        assert_eq!(transform_json(None), "null");
        assert_eq!(reset_json(None), "null");
        assert_eq!(export_json(None), "null");
    }
}
