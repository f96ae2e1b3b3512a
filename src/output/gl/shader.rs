/// 顶点着色器：全视口四边形，纹理坐标直接透传
pub const VERTEX_SHADER: &str = r#"
#version 120

attribute vec2 position;
attribute vec2 tex_coords_in;

varying vec2 tex_coords;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
    tex_coords = tex_coords_in;
}
"#;

/// YUV 到 RGB 转换的片段着色器
///
/// 三个平面各是一张单通道纹理，系数矩阵在显示时按画面高度设置。
pub const FRAGMENT_SHADER: &str = r#"
#version 120

uniform sampler2D plane_y;
uniform sampler2D plane_u;
uniform sampler2D plane_v;
uniform vec4 coefficient[4];

varying vec2 tex_coords;

void main() {
    vec3 src = vec3(
        texture2D(plane_y, tex_coords).r,
        texture2D(plane_u, tex_coords).r,
        texture2D(plane_v, tex_coords).r);

    vec3 tmp = src.x * coefficient[0].rgb + coefficient[3].rgb;
    tmp = src.y * coefficient[1].rgb + tmp;
    gl_FragColor = vec4(src.z * coefficient[2].rgb + tmp, 1.0);
}
"#;

/// 采样器 uniform 名称，下标即纹理单元
pub const SAMPLER_NAMES: [&str; 3] = ["plane_y", "plane_u", "plane_v"];

/// 系数矩阵 uniform 名称
pub const COEFFICIENT_UNIFORM: &str = "coefficient";

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

/// 覆盖整个视口的两个三角形，纹理 (0,0) 对应画面左上角
pub const QUAD_VERTICES: &[Vertex] = &[
    Vertex { position: [-1.0, -1.0], tex_coords: [0.0, 1.0] }, // 左下
    Vertex { position: [1.0, -1.0], tex_coords: [1.0, 1.0] },  // 右下
    Vertex { position: [1.0, 1.0], tex_coords: [1.0, 0.0] },   // 右上
    Vertex { position: [-1.0, -1.0], tex_coords: [0.0, 1.0] }, // 左下
    Vertex { position: [1.0, 1.0], tex_coords: [1.0, 0.0] },   // 右上
    Vertex { position: [-1.0, 1.0], tex_coords: [0.0, 0.0] },  // 左上
];
