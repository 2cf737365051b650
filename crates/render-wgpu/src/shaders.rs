//! Embedded WGSL. Every program is [`PRELUDE`] followed by its own stages.

/// Camera block (group 0) shared by all programs.
const PRELUDE: &str = r#"
struct Camera {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    resolution: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;
"#;

/// Object block (group 1) and the vertex stage used by every model mesh.
const MESH_VERTEX: &str = r#"
struct Object {
    model: mat4x4<f32>,
    color: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> object: Object;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_mesh(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position =
        camera.projection * camera.view * object.model * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    return out;
}
"#;

const BAKED_FRAGMENT: &str = r#"
@group(2) @binding(0)
var baked_texture: texture_2d<f32>;
@group(2) @binding(1)
var baked_sampler: sampler;

@fragment
fn fs_baked(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(textureSample(baked_texture, baked_sampler, in.uv).rgb, 1.0);
}
"#;

const BASIC_FRAGMENT: &str = r#"
@fragment
fn fs_basic(in: VertexOutput) -> @location(0) vec4<f32> {
    return object.color;
}
"#;

/// Classic 3D Perlin noise (Stefan Gustavson) driving the portal swirl.
const PORTAL_FRAGMENT: &str = r#"
struct Portal {
    color_start: vec3<f32>,
    time: f32,
    color_end: vec3<f32>,
    effect_speed: f32,
    outer_glow: f32,
    displaced_uv: f32,
    strength: f32,
    strength_step: f32,
};

@group(2) @binding(0)
var<uniform> portal: Portal;

fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn fade(t: vec3<f32>) -> vec3<f32> {
    return t * t * t * (t * (t * 6.0 - 15.0) + 10.0);
}

fn cnoise(p: vec3<f32>) -> f32 {
    let pi0 = mod289_3(floor(p));
    let pi1 = mod289_3(floor(p) + vec3<f32>(1.0));
    let pf0 = fract(p);
    let pf1 = pf0 - vec3<f32>(1.0);
    let ix = vec4<f32>(pi0.x, pi1.x, pi0.x, pi1.x);
    let iy = vec4<f32>(pi0.yy, pi1.yy);
    let iz0 = pi0.zzzz;
    let iz1 = pi1.zzzz;

    let ixy = permute(permute(ix) + iy);
    let ixy0 = permute(ixy + iz0);
    let ixy1 = permute(ixy + iz1);

    var gx0 = ixy0 * (1.0 / 7.0);
    var gy0 = fract(floor(gx0) * (1.0 / 7.0)) - 0.5;
    gx0 = fract(gx0);
    let gz0 = vec4<f32>(0.5) - abs(gx0) - abs(gy0);
    let sz0 = step(gz0, vec4<f32>(0.0));
    gx0 = gx0 - sz0 * (step(vec4<f32>(0.0), gx0) - 0.5);
    gy0 = gy0 - sz0 * (step(vec4<f32>(0.0), gy0) - 0.5);

    var gx1 = ixy1 * (1.0 / 7.0);
    var gy1 = fract(floor(gx1) * (1.0 / 7.0)) - 0.5;
    gx1 = fract(gx1);
    let gz1 = vec4<f32>(0.5) - abs(gx1) - abs(gy1);
    let sz1 = step(gz1, vec4<f32>(0.0));
    gx1 = gx1 - sz1 * (step(vec4<f32>(0.0), gx1) - 0.5);
    gy1 = gy1 - sz1 * (step(vec4<f32>(0.0), gy1) - 0.5);

    var g000 = vec3<f32>(gx0.x, gy0.x, gz0.x);
    var g100 = vec3<f32>(gx0.y, gy0.y, gz0.y);
    var g010 = vec3<f32>(gx0.z, gy0.z, gz0.z);
    var g110 = vec3<f32>(gx0.w, gy0.w, gz0.w);
    var g001 = vec3<f32>(gx1.x, gy1.x, gz1.x);
    var g101 = vec3<f32>(gx1.y, gy1.y, gz1.y);
    var g011 = vec3<f32>(gx1.z, gy1.z, gz1.z);
    var g111 = vec3<f32>(gx1.w, gy1.w, gz1.w);

    let norm0 = taylor_inv_sqrt(vec4<f32>(
        dot(g000, g000), dot(g010, g010), dot(g100, g100), dot(g110, g110)));
    g000 = g000 * norm0.x;
    g010 = g010 * norm0.y;
    g100 = g100 * norm0.z;
    g110 = g110 * norm0.w;
    let norm1 = taylor_inv_sqrt(vec4<f32>(
        dot(g001, g001), dot(g011, g011), dot(g101, g101), dot(g111, g111)));
    g001 = g001 * norm1.x;
    g011 = g011 * norm1.y;
    g101 = g101 * norm1.z;
    g111 = g111 * norm1.w;

    let n000 = dot(g000, pf0);
    let n100 = dot(g100, vec3<f32>(pf1.x, pf0.y, pf0.z));
    let n010 = dot(g010, vec3<f32>(pf0.x, pf1.y, pf0.z));
    let n110 = dot(g110, vec3<f32>(pf1.x, pf1.y, pf0.z));
    let n001 = dot(g001, vec3<f32>(pf0.x, pf0.y, pf1.z));
    let n101 = dot(g101, vec3<f32>(pf1.x, pf0.y, pf1.z));
    let n011 = dot(g011, vec3<f32>(pf0.x, pf1.y, pf1.z));
    let n111 = dot(g111, pf1);

    let fade_xyz = fade(pf0);
    let n_z = mix(
        vec4<f32>(n000, n100, n010, n110),
        vec4<f32>(n001, n101, n011, n111),
        vec4<f32>(fade_xyz.z));
    let n_yz = mix(n_z.xy, n_z.zw, vec2<f32>(fade_xyz.y));
    let n_xyz = mix(n_yz.x, n_yz.y, fade_xyz.x);
    return 2.2 * n_xyz;
}

@fragment
fn fs_portal(in: VertexOutput) -> @location(0) vec4<f32> {
    let t = portal.time * portal.effect_speed;
    let displaced_uv = in.uv + cnoise(vec3<f32>(in.uv * portal.displaced_uv, t));

    var strength = cnoise(vec3<f32>(displaced_uv * portal.strength, t * 2.0));
    let outer_glow = distance(in.uv, vec2<f32>(0.5)) * portal.outer_glow - 1.4;
    strength = strength + outer_glow;
    strength = strength + step(-0.2, strength) * portal.strength_step;
    strength = clamp(strength, 0.0, 1.0);

    return vec4<f32>(mix(portal.color_start, portal.color_end, strength), 1.0);
}
"#;

/// Camera-facing sprites expanded from one instance per firefly.
const FIREFLIES: &str = r#"
struct Fireflies {
    time: f32,
    pixel_ratio: f32,
    size: f32,
};

@group(1) @binding(0)
var<uniform> fireflies: Fireflies;

struct ParticleInput {
    @location(0) position: vec3<f32>,
    @location(1) scale: f32,
};

struct ParticleOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) coord: vec2<f32>,
};

@vertex
fn vs_fireflies(@builtin(vertex_index) index: u32, particle: ParticleInput) -> ParticleOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    let corner = corners[index];

    var world = vec4<f32>(particle.position, 1.0);
    world.y = world.y + sin(fireflies.time + world.x * 100.0) * particle.scale * 0.2;
    let view_position = camera.view * world;

    // Sprite edge in pixels, attenuated with depth.
    let size = fireflies.size * particle.scale * fireflies.pixel_ratio / -view_position.z;
    let clip = camera.projection * view_position;
    let offset = corner * size * 2.0 / camera.resolution * clip.w;

    var out: ParticleOutput;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.z, clip.w);
    out.coord = corner + vec2<f32>(0.5);
    return out;
}

@fragment
fn fs_fireflies(in: ParticleOutput) -> @location(0) vec4<f32> {
    let distance_to_center = distance(in.coord, vec2<f32>(0.5));
    let strength = 0.05 / distance_to_center - 0.1;
    return vec4<f32>(1.0, 1.0, 1.0, clamp(strength, 0.0, 1.0));
}
"#;

/// Full-screen triangle that scales the drawing buffer up to the surface.
const UPSCALE: &str = r#"
@group(0) @binding(0)
var scene_texture: texture_2d<f32>;
@group(0) @binding(1)
var scene_sampler: sampler;

struct UpscaleOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_upscale(@builtin(vertex_index) index: u32) -> UpscaleOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: UpscaleOutput;
    out.clip_position = vec4<f32>(uv * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0), 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_upscale(in: UpscaleOutput) -> @location(0) vec4<f32> {
    return textureSample(scene_texture, scene_sampler, in.uv);
}
"#;

pub(crate) fn baked() -> String {
    [PRELUDE, MESH_VERTEX, BAKED_FRAGMENT].concat()
}

pub(crate) fn basic() -> String {
    [PRELUDE, MESH_VERTEX, BASIC_FRAGMENT].concat()
}

pub(crate) fn portal() -> String {
    [PRELUDE, MESH_VERTEX, PORTAL_FRAGMENT].concat()
}

pub(crate) fn fireflies() -> String {
    [PRELUDE, FIREFLIES].concat()
}

pub(crate) fn upscale() -> &'static str {
    UPSCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programs_define_their_entry_points() {
        for (source, entries) in [
            (baked(), ["fn vs_mesh", "fn fs_baked"]),
            (basic(), ["fn vs_mesh", "fn fs_basic"]),
            (portal(), ["fn vs_mesh", "fn fs_portal"]),
            (fireflies(), ["fn vs_fireflies", "fn fs_fireflies"]),
        ] {
            assert!(source.contains("var<uniform> camera"));
            for entry in entries {
                assert!(source.contains(entry), "missing {entry}");
            }
        }
    }

    #[test]
    fn upscale_program_samples_the_drawing_buffer() {
        let source = upscale();
        assert!(source.contains("fn vs_upscale"));
        assert!(source.contains("fn fs_upscale"));
        assert!(source.contains("textureSample(scene_texture"));
        assert!(!source.contains("var<uniform> camera"));
    }

    #[test]
    fn portal_program_reads_every_uniform() {
        let source = portal();
        for field in [
            "portal.time",
            "portal.color_start",
            "portal.color_end",
            "portal.effect_speed",
            "portal.outer_glow",
            "portal.displaced_uv",
            "portal.strength",
            "portal.strength_step",
        ] {
            assert!(source.contains(field), "unused uniform {field}");
        }
    }
}
