//! WGSL source generation.
//!
//! Sources are generated with the workgroup size baked in, so each distinct
//! size compiles to its own pipeline (cached by the runtime).

/// One separable blur pass. The `horizontal` uniform selects the axis, so
/// both passes share a pipeline and differ only in their bound params.
pub fn blur_shader_source(workgroup_x: u32, workgroup_y: u32) -> String {
    format!(
        r#"
struct Params {{
  width: u32,
  height: u32,
  radius: u32,
  horizontal: u32,
}}

@group(0) @binding(0)
var<storage, read> input: array<f32>;

@group(0) @binding(1)
var<storage, read> taps: array<f32>;

@group(0) @binding(2)
var<storage, read_write> output: array<f32>;

@group(0) @binding(3)
var<uniform> params: Params;

@compute @workgroup_size({wg_x}, {wg_y}, 1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {{
  let x = gid.x;
  let y = gid.y;
  if (x >= params.width || y >= params.height) {{
    return;
  }}

  var acc: f32 = 0.0;
  let count: u32 = 2u * params.radius + 1u;
  var t: u32 = 0u;
  loop {{
    if (t >= count) {{
        break;
    }}
    let offset: i32 = i32(t) - i32(params.radius);
    if (params.horizontal == 1u) {{
      let sx = clamp(i32(x) + offset, 0, i32(params.width) - 1);
      acc = acc + taps[t] * input[y * params.width + u32(sx)];
    }} else {{
      let sy = clamp(i32(y) + offset, 0, i32(params.height) - 1);
      acc = acc + taps[t] * input[u32(sy) * params.width + x];
    }}
    t = t + 1u;
  }}

  output[y * params.width + x] = acc;
}}
"#,
        wg_x = workgroup_x,
        wg_y = workgroup_y
    )
}

/// Stage one of the min/max reduction: each workgroup folds a grid-strided
/// slice of the input through shared memory and writes one (min, max) pair.
/// Stage two (merging the pairs) runs on the host. Requires a power-of-two
/// workgroup size.
pub fn min_max_shader_source(workgroup_size: u32) -> String {
    debug_assert!(workgroup_size.is_power_of_two());
    format!(
        r#"
struct Params {{
  len: u32,
  stride: u32,
  _pad0: u32,
  _pad1: u32,
}}

@group(0) @binding(0)
var<storage, read> input: array<f32>;

@group(0) @binding(1)
var<storage, read_write> partials: array<f32>;

@group(0) @binding(2)
var<uniform> params: Params;

const FLT_MAX: f32 = 3.4028235e38;

var<workgroup> span_min: array<f32, {wg}>;
var<workgroup> span_max: array<f32, {wg}>;

@compute @workgroup_size({wg}, 1, 1)
fn main(@builtin(local_invocation_id) lid: vec3<u32>,
        @builtin(workgroup_id) wid: vec3<u32>,
        @builtin(global_invocation_id) gid: vec3<u32>) {{
  var lo: f32 = FLT_MAX;
  var hi: f32 = -FLT_MAX;

  var idx: u32 = gid.x;
  loop {{
    if (idx >= params.len) {{
        break;
    }}
    let v = input[idx];
    lo = min(lo, v);
    hi = max(hi, v);
    idx = idx + params.stride;
  }}

  span_min[lid.x] = lo;
  span_max[lid.x] = hi;
  workgroupBarrier();

  var offset: u32 = {wg}u / 2u;
  loop {{
    if (offset == 0u) {{
        break;
    }}
    if (lid.x < offset) {{
      span_min[lid.x] = min(span_min[lid.x], span_min[lid.x + offset]);
      span_max[lid.x] = max(span_max[lid.x], span_max[lid.x + offset]);
    }}
    workgroupBarrier();
    offset = offset / 2u;
  }}

  if (lid.x == 0u) {{
    partials[2u * wid.x] = span_min[0];
    partials[2u * wid.x + 1u] = span_max[0];
  }}
}}
"#,
        wg = workgroup_size
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_source_bakes_workgroup_size() {
        let src = blur_shader_source(16, 16);
        assert!(src.contains("@workgroup_size(16, 16, 1)"));
        assert!(src.contains("params.horizontal"));
    }

    #[test]
    fn min_max_source_bakes_workgroup_size() {
        let src = min_max_shader_source(128);
        assert!(src.contains("@workgroup_size(128, 1, 1)"));
        assert!(src.contains("array<f32, 128>"));
    }
}
