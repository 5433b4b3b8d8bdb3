//! SVG backend: converts a `RenderCommand` list into a standalone SVG string.

use cenplot_protocol::{Color, Point, RenderCommand, TextAlign};

/// Open `<g>` elements, innermost last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Clip,
    Transform,
    Group,
}

/// Render commands as an SVG document.
///
/// The viewBox is the pixel canvas; `width_in`/`height_in` give the
/// physical size.
pub fn render_svg(
    commands: &[RenderCommand],
    width: f64,
    height: f64,
    width_in: f64,
    height_in: f64,
) -> String {
    let mut svg = String::with_capacity(commands.len() * 120);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width_in}in" height="{height_in}in" font-family="DejaVu Sans,Arial,sans-serif">"#,
    ));

    let mut open: Vec<Open> = Vec::new();
    let mut clip_ids = 0usize;

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                fill,
                stroke,
                label,
            } => {
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}"#,
                    num(rect.x),
                    num(rect.y),
                    num(rect.w.max(0.0)),
                    num(rect.h.max(0.0)),
                    paint("fill", *fill),
                    stroke.map(|s| paint("stroke", s)).unwrap_or_default(),
                ));
                match label {
                    Some(label) => {
                        svg.push_str(&format!("><title>{}</title></rect>", escape_xml(label)));
                    }
                    None => svg.push_str("/>"),
                }
            }
            RenderCommand::DrawPolygon {
                points,
                fill,
                stroke,
            } => {
                svg.push_str(&format!(
                    r#"<polygon points="{}"{}{}/>"#,
                    point_list(points),
                    paint("fill", *fill),
                    stroke.map(|s| paint("stroke", s)).unwrap_or_default(),
                ));
            }
            RenderCommand::DrawArrow {
                from,
                to,
                shaft_width,
                head_width,
                head_length,
                color,
            } => {
                if let Some(points) =
                    arrow_outline(*from, *to, *shaft_width, *head_width, *head_length)
                {
                    svg.push_str(&format!(
                        r#"<polygon points="{}"{}/>"#,
                        point_list(&points),
                        paint("fill", *color),
                    ));
                }
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width,
            } => {
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{} stroke-width="{}"/>"#,
                    num(from.x),
                    num(from.y),
                    num(to.x),
                    num(to.y),
                    paint("stroke", *color),
                    num(*width),
                ));
            }
            RenderCommand::DrawPolyline {
                points,
                color,
                width,
            } => {
                svg.push_str(&format!(
                    r#"<polyline points="{}" fill="none"{} stroke-width="{}"/>"#,
                    point_list(points),
                    paint("stroke", *color),
                    num(*width),
                ));
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
                rotation,
            } => write_text(&mut svg, *position, text, *color, *font_size, *align, *rotation),
            RenderCommand::SetClip { rect } => {
                if open.last() == Some(&Open::Clip) {
                    open.pop();
                    svg.push_str("</g>");
                }
                clip_ids += 1;
                svg.push_str(&format!(
                    r#"<clipPath id="clip{clip_ids}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath><g clip-path="url(#clip{clip_ids})">"#,
                    num(rect.x),
                    num(rect.y),
                    num(rect.w.max(0.0)),
                    num(rect.h.max(0.0)),
                ));
                open.push(Open::Clip);
            }
            RenderCommand::ClearClip => close(&mut svg, &mut open, Open::Clip),
            RenderCommand::PushTransform { translate, scale } => {
                svg.push_str(&format!(
                    r#"<g transform="translate({} {}) scale({} {})">"#,
                    num(translate.x),
                    num(translate.y),
                    num(scale.x),
                    num(scale.y),
                ));
                open.push(Open::Transform);
            }
            RenderCommand::PopTransform => close(&mut svg, &mut open, Open::Transform),
            RenderCommand::BeginGroup { id, label } => {
                svg.push_str(&format!(r#"<g id="{}">"#, escape_xml(id)));
                if let Some(label) = label {
                    svg.push_str(&format!("<title>{}</title>", escape_xml(label)));
                }
                open.push(Open::Group);
            }
            RenderCommand::EndGroup => close(&mut svg, &mut open, Open::Group),
        }
    }

    for _ in open.drain(..) {
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

/// Close every group down to and including the innermost `kind`.
fn close(svg: &mut String, open: &mut Vec<Open>, kind: Open) {
    let Some(at) = open.iter().rposition(|o| *o == kind) else {
        log::debug!("unbalanced {kind:?} close ignored");
        return;
    };
    for _ in at..open.len() {
        svg.push_str("</g>");
    }
    open.truncate(at);
}

fn write_text(
    svg: &mut String,
    position: Point,
    text: &str,
    color: Color,
    font_size: f64,
    align: TextAlign,
    rotation: f64,
) {
    let anchor = match align {
        TextAlign::Left => "start",
        TextAlign::Center => "middle",
        TextAlign::Right => "end",
    };
    let (x, y) = (num(position.x), num(position.y));
    svg.push_str(&format!(
        r#"<text x="{x}" y="{y}" font-size="{}" text-anchor="{anchor}"{}"#,
        num(font_size),
        paint("fill", color),
    ));
    if rotation != 0.0 {
        svg.push_str(&format!(r#" transform="rotate({} {x} {y})""#, num(-rotation)));
    }
    svg.push('>');
    let mut lines = text.split('\n');
    match (lines.next(), text.contains('\n')) {
        (Some(only), false) => svg.push_str(&escape_xml(only)),
        (Some(first), true) => {
            svg.push_str(&format!(r#"<tspan x="{x}">{}</tspan>"#, escape_xml(first)));
            for line in lines {
                svg.push_str(&format!(r#"<tspan x="{x}" dy="1.2em">{}</tspan>"#, escape_xml(line)));
            }
        }
        (None, _) => {}
    }
    svg.push_str("</text>");
}

/// Outline of an arrow whose head ends at `to`. `None` for zero length.
fn arrow_outline(
    from: Point,
    to: Point,
    shaft_width: f64,
    head_width: f64,
    head_length: f64,
) -> Option<[Point; 7]> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len = dx.hypot(dy);
    if len <= 0.0 {
        return None;
    }
    let (ux, uy) = (dx / len, dy / len);
    let (nx, ny) = (-uy, ux);
    let head = head_length.clamp(0.0, len);
    let base = Point::new(to.x - ux * head, to.y - uy * head);
    let off = |p: Point, w: f64| Point::new(p.x + nx * w / 2.0, p.y + ny * w / 2.0);
    Some([
        off(from, shaft_width),
        off(base, shaft_width),
        off(base, head_width),
        to,
        off(base, -head_width),
        off(base, -shaft_width),
        off(from, -shaft_width),
    ])
}

fn paint(attr: &str, color: Color) -> String {
    if color.a >= 1.0 {
        format!(r#" {attr}="{}""#, color.to_hex())
    } else {
        format!(
            r#" {attr}="{}" {attr}-opacity="{}""#,
            color.to_hex(),
            num(f64::from(color.a.clamp(0.0, 1.0)))
        )
    }
}

fn point_list(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Two decimals, trailing zeros trimmed.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        _ => s.to_string(),
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
