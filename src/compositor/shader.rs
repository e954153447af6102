//! WGSL fragment/vertex shader source for the compositor's single render
//! pass: screen-filling quad, delta-crop sampling, per-channel remap + LUT,
//! additive accumulate.

use super::uniform::MAX_CHANNELS;

/// Builds the shader source for `max_channels` bound frame/LUT texture
/// pairs. `max_channels` must match the compositor's bind group layout:
/// binding 0 is the uniform buffer, binding 1 the sampler, and each slot
/// `i` owns bindings `2+2i` (frame texture) and `2+2i+1` (LUT texture).
pub fn shader_source(max_channels: usize) -> String {
    let mut texture_bindings = String::new();
    for i in 0..max_channels {
        let frame_binding = 2 + i * 2;
        let lut_binding = frame_binding + 1;
        texture_bindings.push_str(&format!(
            "@group(0) @binding({frame_binding}) var frame_{i}: texture_2d<f32>;\n\
             @group(0) @binding({lut_binding}) var lut_{i}: texture_2d<f32>;\n"
        ));
    }

    let mut sample_channel_cases = String::new();
    let mut sample_lut_cases = String::new();
    for i in 0..max_channels {
        sample_channel_cases.push_str(&format!(
            "        case {i}u: {{ return textureSample(frame_{i}, samp, uv); }}\n"
        ));
        sample_lut_cases.push_str(&format!(
            "        case {i}u: {{ return textureSample(lut_{i}, samp, vec2<f32>(r, 0.5)).rgb; }}\n"
        ));
    }

    format!(
        r#"
struct ChannelUniform {{
    min: f32,
    max: f32,
    apply_lut: u32,
    enabled: u32,
}};

struct Uniforms {{
    delta_crop: vec4<f32>,
    display_mode: u32,
    active_count: u32,
    _pad0: u32,
    _pad1: u32,
    channels: array<ChannelUniform, {max_channels}>,
}};

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var samp: sampler;
{texture_bindings}
struct VertexOut {{
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOut {{
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0), vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, 1.0), vec2<f32>(1.0, -1.0), vec2<f32>(1.0, 1.0),
    );
    var out: VertexOut;
    let p = positions[idx];
    out.position = vec4<f32>(p, 0.0, 1.0);
    out.uv = vec2<f32>((p.x + 1.0) * 0.5, 1.0 - (p.y + 1.0) * 0.5);
    return out;
}}

fn remap(value: f32, lo: f32, hi: f32) -> f32 {{
    if (hi <= lo) {{
        return 0.0;
    }}
    return clamp((value - lo) / (hi - lo), 0.0, 1.0);
}}

fn sample_channel(i: u32, uv: vec2<f32>) -> vec4<f32> {{
    switch i {{
{sample_channel_cases}        default: {{ return vec4<f32>(0.0); }}
    }}
}}

fn sample_lut(i: u32, r: f32) -> vec3<f32> {{
    switch i {{
{sample_lut_cases}        default: {{ return vec3<f32>(r, r, r); }}
    }}
}}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {{
    let k = u.delta_crop.z;
    let uv = clamp(in.uv * (1.0 - k) + u.delta_crop.xy, vec2<f32>(0.0), vec2<f32>(1.0));

    var accum = vec4<f32>(0.0, 0.0, 0.0, 0.0);
    for (var i: u32 = 0u; i < {max_channels}u; i = i + 1u) {{
        if (u.channels[i].enabled == 0u) {{
            continue;
        }}
        let texel = sample_channel(i, uv);
        let r = remap(texel.r, u.channels[i].min, u.channels[i].max);
        var color = vec3<f32>(r, r, r);
        if (u.channels[i].apply_lut != 0u) {{
            color = sample_lut(i, r);
        }}
        accum = accum + vec4<f32>(color, 1.0);
    }}
    return clamp(accum, vec4<f32>(0.0), vec4<f32>(1.0));
}}
"#,
        max_channels = max_channels,
        texture_bindings = texture_bindings,
        sample_channel_cases = sample_channel_cases,
        sample_lut_cases = sample_lut_cases,
    )
}

/// Source for the default-sized (compile-time [`MAX_CHANNELS`]) shader.
pub fn default_shader_source() -> String {
    shader_source(MAX_CHANNELS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_source_embeds_channel_count() {
        let src = shader_source(4);
        assert!(src.contains("array<ChannelUniform, 4>"));
        assert!(src.contains("i < 4u"));
    }

    #[test]
    fn shader_source_declares_a_texture_pair_per_slot() {
        let src = shader_source(3);
        for i in 0..3 {
            assert!(src.contains(&format!("var frame_{i}: texture_2d<f32>;")));
            assert!(src.contains(&format!("var lut_{i}: texture_2d<f32>;")));
            assert!(src.contains(&format!("case {i}u:")));
        }
        // bindings start at 2 and step by 2 per slot.
        assert!(src.contains("@binding(2) var frame_0"));
        assert!(src.contains("@binding(3) var lut_0"));
        assert!(src.contains("@binding(4) var frame_1"));
        assert!(src.contains("@binding(5) var lut_1"));
    }

    #[test]
    fn default_shader_uses_max_channels_constant() {
        let src = default_shader_source();
        assert!(src.contains(&format!("array<ChannelUniform, {MAX_CHANNELS}>")));
        assert!(src.contains(&format!("@binding({}) var frame_{}", 2 + (MAX_CHANNELS - 1) * 2, MAX_CHANNELS - 1)));
    }
}
