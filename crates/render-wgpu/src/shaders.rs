//! WGSL sources. The structs at the top of each compute shader mirror
//! `FrameParameters` and `GpuObject` field for field.

/// Binding contract shared by every compute kernel.
const KERNEL_BINDINGS: &str = r#"
struct FrameParameters {
    camera_position: vec3<f32>,
    tan_half_fov: f32,
    camera_right: vec3<f32>,
    aspect: f32,
    camera_up: vec3<f32>,
    object_count: u32,
    camera_forward: vec3<f32>,
    disk_inner: f32,
    disk_outer: f32,
};

struct GpuObject {
    position: vec3<f32>,
    radius: f32,
    color: vec3<f32>,
    mass: f32,
};

@group(0) @binding(0)
var<uniform> params: FrameParameters;

@group(0) @binding(1)
var<storage, read> objects: array<GpuObject>;

@group(0) @binding(2)
var output: texture_storage_2d<rgba8unorm, write>;
"#;

/// Gravitationally bent ray march through the scene.
///
/// Each ray is stepped in proportion to its clearance from the nearest body
/// and bent toward every mass by `rs / r^2` per unit length. It terminates on
/// a body surface, on crossing the accretion band in the equatorial plane, or
/// on escaping past the camera.
const GEODESIC_BODY: &str = r#"
const C: f32 = 299792458.0;
const G: f32 = 6.6743e-11;
const MAX_STEPS: u32 = 512u;

fn background(dir: vec3<f32>) -> vec3<f32> {
    let cell = floor(dir * 180.0);
    let h = fract(sin(dot(cell, vec3<f32>(12.9898, 78.233, 37.719))) * 43758.5453);
    var star = 0.0;
    if (h > 0.996) {
        star = 0.9;
    }
    return vec3<f32>(0.01, 0.01, 0.02) + vec3<f32>(star);
}

fn disk_color(r: f32) -> vec3<f32> {
    let t = clamp((r - params.disk_inner) / (params.disk_outer - params.disk_inner), 0.0, 1.0);
    return mix(vec3<f32>(1.0, 0.95, 0.8), vec3<f32>(0.9, 0.35, 0.05), vec3<f32>(t));
}

@compute @workgroup_size(8, 8, 1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let size = textureDimensions(output);
    if (id.x >= size.x || id.y >= size.y) {
        return;
    }

    let ndc = (vec2<f32>(id.xy) + vec2<f32>(0.5)) / vec2<f32>(size) * 2.0 - vec2<f32>(1.0);
    var dir = normalize(
        params.camera_forward
        + params.camera_right * (ndc.x * params.tan_half_fov * params.aspect)
        - params.camera_up * (ndc.y * params.tan_half_fov)
    );
    var pos = params.camera_position;
    let escape = max(2.0 * length(params.camera_position), 1.0e12);
    var color = background(dir);

    for (var i = 0u; i < MAX_STEPS; i = i + 1u) {
        var bend = vec3<f32>(0.0);
        var clearance = 1.0e30;
        var hit = -1;
        for (var k = 0u; k < params.object_count; k = k + 1u) {
            let body = objects[k];
            let offset = body.position - pos;
            let r = length(offset);
            let rs = 2.0 * G * body.mass / (C * C);
            let surface = max(body.radius, rs);
            if (r <= surface) {
                hit = i32(k);
                break;
            }
            clearance = min(clearance, r - surface);
            bend = bend + (offset / r) * (rs / (r * r));
        }
        if (hit >= 0) {
            let body = objects[u32(hit)];
            let normal = normalize(pos - body.position);
            let shade = 0.3 + 0.7 * max(dot(normal, -dir), 0.0);
            color = body.color * shade;
            break;
        }

        let ds = max(clearance * 0.25, length(pos) * 1.0e-4);
        let next_dir = normalize(dir + bend * ds);
        let next_pos = pos + next_dir * ds;

        if (sign(pos.y) != sign(next_pos.y)) {
            let t = pos.y / (pos.y - next_pos.y);
            let crossing = pos + (next_pos - pos) * t;
            let r = length(crossing.xz);
            if (r >= params.disk_inner && r <= params.disk_outer) {
                color = disk_color(r);
                break;
            }
        }

        dir = next_dir;
        pos = next_pos;
        if (length(pos) > escape && dot(pos, dir) > 0.0) {
            color = background(dir);
            break;
        }
    }

    textureStore(output, vec2<i32>(id.xy), vec4<f32>(color, 1.0));
}
"#;

/// Deterministic gradient and workgroup checkerboard, for checking the
/// dispatch and composite path without the geodesic kernel.
const PATTERN_BODY: &str = r#"
@compute @workgroup_size(8, 8, 1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let size = textureDimensions(output);
    if (id.x >= size.x || id.y >= size.y) {
        return;
    }
    let span = max(size - vec2<u32>(1u), vec2<u32>(1u));
    let ramp = vec2<f32>(id.xy) / vec2<f32>(span);
    let tile = id.xy / vec2<u32>(8u);
    var checker = 0.0;
    if ((tile.x + tile.y) % 2u == 0u) {
        checker = 1.0;
    }
    textureStore(output, vec2<i32>(id.xy), vec4<f32>(ramp, checker, 1.0));
}
"#;

/// Full-screen triangle that samples the output image with a nearest sampler.
/// The render pass viewport does the letterboxing.
pub const COMPOSITE_SHADER: &str = r#"
@group(0) @binding(0)
var image: texture_2d<f32>;

@group(0) @binding(1)
var image_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.clip_position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_composite(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(image, image_sampler, in.uv);
}
"#;

pub fn geodesic_source() -> String {
    format!("{KERNEL_BINDINGS}{GEODESIC_BODY}")
}

pub fn pattern_source() -> String {
    format!("{KERNEL_BINDINGS}{PATTERN_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lensing_common::constants::WORKGROUP_SIZE;
    use lensing_render::FrameParameters;
    use lensing_scene::GpuObject;
    use std::mem::{offset_of, size_of};

    fn parse_and_validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|err| panic!("{}", err.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap_or_else(|err| panic!("invalid shader: {err:?}"));
        module
    }

    /// `(member name, offset)` pairs and the span of the named struct.
    fn struct_layout(module: &naga::Module, name: &str) -> (Vec<(String, u32)>, u32) {
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some(name))
            .unwrap_or_else(|| panic!("struct {name} missing"));
        let naga::TypeInner::Struct { members, span } = &ty.inner else {
            panic!("{name} is not a struct");
        };
        let fields = members
            .iter()
            .map(|m| (m.name.clone().unwrap_or_default(), m.offset))
            .collect();
        (fields, *span)
    }

    fn member_type<'a>(module: &'a naga::Module, name: &str, member: &str) -> &'a naga::TypeInner {
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some(name))
            .unwrap_or_else(|| panic!("struct {name} missing"));
        let naga::TypeInner::Struct { members, .. } = &ty.inner else {
            panic!("{name} is not a struct");
        };
        let m = members
            .iter()
            .find(|m| m.name.as_deref() == Some(member))
            .unwrap_or_else(|| panic!("{name}.{member} missing"));
        &module.types[m.ty].inner
    }

    fn owned(fields: &[(&str, usize)]) -> Vec<(String, u32)> {
        fields
            .iter()
            .map(|&(n, o)| (n.to_string(), o as u32))
            .collect()
    }

    #[test]
    fn frame_parameters_layout_matches_host() {
        for source in [geodesic_source(), pattern_source()] {
            let module = parse_and_validate(&source);
            let (fields, span) = struct_layout(&module, "FrameParameters");
            assert_eq!(
                fields,
                owned(&[
                    ("camera_position", offset_of!(FrameParameters, camera_position)),
                    ("tan_half_fov", offset_of!(FrameParameters, tan_half_fov)),
                    ("camera_right", offset_of!(FrameParameters, camera_right)),
                    ("aspect", offset_of!(FrameParameters, aspect)),
                    ("camera_up", offset_of!(FrameParameters, camera_up)),
                    ("object_count", offset_of!(FrameParameters, object_count)),
                    ("camera_forward", offset_of!(FrameParameters, camera_forward)),
                    ("disk_inner", offset_of!(FrameParameters, disk_inner)),
                    ("disk_outer", offset_of!(FrameParameters, disk_outer)),
                ])
            );
            assert_eq!(span as usize, size_of::<FrameParameters>());
            assert_eq!(span, 80);
            assert_eq!(
                member_type(&module, "FrameParameters", "object_count"),
                &naga::TypeInner::Scalar(naga::Scalar::U32)
            );
            assert_eq!(
                member_type(&module, "FrameParameters", "disk_outer"),
                &naga::TypeInner::Scalar(naga::Scalar::F32)
            );
        }
    }

    #[test]
    fn object_layout_matches_host() {
        let module = parse_and_validate(&geodesic_source());
        let (fields, span) = struct_layout(&module, "GpuObject");
        assert_eq!(
            fields,
            owned(&[
                ("position", offset_of!(GpuObject, position)),
                ("radius", offset_of!(GpuObject, radius)),
                ("color", offset_of!(GpuObject, color)),
                ("mass", offset_of!(GpuObject, mass)),
            ])
        );
        assert_eq!(span as usize, size_of::<GpuObject>());

        let (_, objects) = module
            .global_variables
            .iter()
            .find(|(_, var)| var.name.as_deref() == Some("objects"))
            .expect("objects binding");
        let naga::TypeInner::Array { stride, .. } = module.types[objects.ty].inner else {
            panic!("objects is not an array");
        };
        assert_eq!(stride, 32);
        assert_eq!(stride as usize, size_of::<GpuObject>());
    }

    #[test]
    fn kernels_bind_the_shared_contract() {
        for source in [geodesic_source(), pattern_source()] {
            let module = parse_and_validate(&source);
            let binding_of = |name: &str| {
                module
                    .global_variables
                    .iter()
                    .find(|(_, var)| var.name.as_deref() == Some(name))
                    .and_then(|(_, var)| var.binding.clone())
                    .map(|b| (b.group, b.binding))
            };
            assert_eq!(binding_of("params"), Some((0, 0)));
            assert_eq!(binding_of("objects"), Some((0, 1)));
            assert_eq!(binding_of("output"), Some((0, 2)));

            let entry = module
                .entry_points
                .iter()
                .find(|ep| ep.name == "main")
                .expect("main entry point");
            assert_eq!(entry.stage, naga::ShaderStage::Compute);
            assert_eq!(entry.workgroup_size, [WORKGROUP_SIZE, WORKGROUP_SIZE, 1]);
        }
        assert!(pattern_source().contains(&format!("vec2<u32>({WORKGROUP_SIZE}u)")));
    }

    #[test]
    fn composite_has_both_stages() {
        let module = parse_and_validate(COMPOSITE_SHADER);
        let stages: Vec<_> = module
            .entry_points
            .iter()
            .map(|ep| (ep.name.as_str(), ep.stage))
            .collect();
        assert!(stages.contains(&("vs_fullscreen", naga::ShaderStage::Vertex)));
        assert!(stages.contains(&("fs_composite", naga::ShaderStage::Fragment)));
    }
}
