//! The tile scene: a checkerboard floor of textured quads, a colour strip,
//! grid lines and marker points.

use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use tilegl_engine::draw::attribute_bytes;
use tilegl_engine::{
    DrawingMode, GlPrimitive, GlState, GlStateManager, MipMapOptions, Vec3, Vec4, WindowSize,
};

pub const SIZE: WindowSize = WindowSize::new(256, 192);

const TILE: f32 = 32.0;
const COLS: u32 = 8;
const ROWS: u32 = 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct TileVert {
    pos: [f32; 2],
    uv: [f32; 2],
    colour: [u8; 4],
}

const STRIDE: usize = std::mem::size_of::<TileVert>();

/// 8x8 floor tile with a transparent corner notch, RGBA8 rows.
fn floor_texture() -> Vec<u8> {
    let mut pixels = Vec::with_capacity(8 * 8 * 4);
    for y in 0..8u32 {
        for x in 0..8u32 {
            let texel = if x + y < 2 {
                [0, 0, 0, 0]
            } else if (x / 2 + y / 2) % 2 == 0 {
                [120, 110, 90, 255]
            } else {
                [90, 80, 70, 255]
            };
            pixels.extend_from_slice(&texel);
        }
    }
    pixels
}

/// One unit quad; each tile is placed with `pretranslate`/`prescale`.
const UNIT_QUAD: [TileVert; 4] = [
    TileVert { pos: [0.0, 0.0], uv: [0.0, 0.0], colour: [255; 4] },
    TileVert { pos: [1.0, 0.0], uv: [1.0, 0.0], colour: [255; 4] },
    TileVert { pos: [1.0, 1.0], uv: [1.0, 1.0], colour: [255; 4] },
    TileVert { pos: [0.0, 1.0], uv: [0.0, 1.0], colour: [255; 4] },
];

fn stream<'a>(
    verts: &'a [TileVert],
    mode: DrawingMode,
    colours: bool,
    uvs: bool,
) -> GlPrimitive<'a> {
    GlPrimitive::new(
        STRIDE,
        verts.len(),
        2,
        mode,
        Some(attribute_bytes(verts, offset_of!(TileVert, pos))),
        colours.then(|| attribute_bytes(verts, offset_of!(TileVert, colour))),
        uvs.then(|| attribute_bytes(verts, offset_of!(TileVert, uv))),
    )
}

pub fn draw(m: &mut dyn GlStateManager) {
    m.reset_view_for_resize(SIZE);
    m.begin_frame(Vec4::new(0.05, 0.05, 0.08, 1.0));

    // Floor.
    let floor = m.generate_textures(1);
    m.bind_texture(floor[0]);
    m.pixelstore_unpack_alignment(4);
    m.load_texture(&floor_texture(), 8, 8, MipMapOptions::Create);

    m.set(&GlState {
        array_vertex: true,
        array_texcoord: true,
        texture: true,
        blend: true,
        alphatest: true,
        alpharef: 0,
        ..GlState::default()
    });
    m.set_current_color(Vec3::new(1.0, 1.0, 1.0));
    let quad = stream(&UNIT_QUAD, DrawingMode::Quads, false, true);
    for row in 0..ROWS {
        for col in 0..COLS {
            let at = Vec3::new(col as f32 * TILE, row as f32 * TILE, 0.0);
            m.draw_primitive(
                &quad.with_pretranslate(at).with_prescale(Vec3::new(TILE, TILE, 1.0)),
            );
        }
    }

    // Colour strip along the bottom, per-vertex colours.
    let strip: Vec<TileVert> = (0..=8)
        .flat_map(|i| {
            let x = i as f32 * TILE;
            let hue = [(i * 30) as u8, (255 - i * 28) as u8, 160, 255];
            let shade = [hue[0] / 2, hue[1] / 2, 80, 255];
            [
                TileVert { pos: [x, 140.0], uv: [0.0; 2], colour: hue },
                TileVert { pos: [x, 180.0], uv: [0.0; 2], colour: shade },
            ]
        })
        .collect();
    m.bind_texture(tilegl_engine::TextureId::NONE);
    m.set(&GlState { array_vertex: true, array_colour: true, ..GlState::default() });
    m.draw_primitive(&stream(&strip, DrawingMode::TriangleStrip, true, false));

    // Grid lines over the floor, in the current colour.
    let mut grid = Vec::new();
    for col in 0..=COLS {
        let x = col as f32 * TILE;
        grid.push(TileVert { pos: [x, 0.0], ..UNIT_QUAD[0] });
        grid.push(TileVert { pos: [x, ROWS as f32 * TILE], ..UNIT_QUAD[0] });
    }
    m.set(&GlState { array_vertex: true, ..GlState::default() });
    m.set_current_color_rgba(Vec4::new(0.0, 0.0, 0.0, 1.0));
    m.draw_primitive(&stream(&grid, DrawingMode::Lines, false, false));

    // Marker points in the middle of the first row, yellow for this draw only.
    let markers: Vec<TileVert> = (0..COLS)
        .map(|col| TileVert { pos: [col as f32 * TILE + TILE / 2.0, TILE / 2.0], ..UNIT_QUAD[0] })
        .collect();
    m.draw_primitive(
        &stream(&markers, DrawingMode::Points, false, false).with_color(Vec3::new(1.0, 1.0, 0.0)),
    );

    m.end_frame();
    m.delete_textures(&floor);
}
