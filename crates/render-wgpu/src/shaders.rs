/// WGSL shader for lit, fogged scene meshes.
///
/// Lighting is a sky/ground hemisphere term plus one directional light, both
/// diffuse only. Back faces flip their normal so double-sided meshes light the
/// same from either side.
pub const SCENE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    fog_color: vec4<f32>,
    // x = near, y = far
    fog_range: vec4<f32>,
    hemi_sky: vec4<f32>,
    hemi_ground: vec4<f32>,
    hemi_up: vec4<f32>,
    sun_color: vec4<f32>,
    sun_dir: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize(world_normal);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = normalize(in.world_normal);
    if (!front) {
        n = -n;
    }

    let hemi_weight = 0.5 * dot(n, uniforms.hemi_up.xyz) + 0.5;
    let hemi = mix(uniforms.hemi_ground.rgb, uniforms.hemi_sky.rgb, hemi_weight);
    let sun = uniforms.sun_color.rgb * max(dot(n, uniforms.sun_dir.xyz), 0.0);
    let lit = min(in.color.rgb * (hemi + sun), vec3<f32>(1.0));

    let dist = length(in.world_pos - uniforms.camera_pos.xyz);
    let fog = smoothstep(uniforms.fog_range.x, uniforms.fog_range.y, dist);
    return vec4<f32>(mix(lit, uniforms.fog_color.rgb, fog), in.color.a);
}
"#;
