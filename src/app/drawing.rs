use crate::constants::{SCREEN_HEIGHT, SCREEN_WIDTH, SHADE_COLORS};
use sdl2::render::{Canvas, Texture};
use sdl2::video::Window;

/// Uploads the shade framebuffer into the streaming texture and presents it.
pub fn present_frame(
    canvas: &mut Canvas<Window>,
    texture: &mut Texture,
    framebuffer: &[[u8; SCREEN_WIDTH]; SCREEN_HEIGHT],
) -> Result<(), String> {
    texture
        .with_lock(None, |pixels: &mut [u8], pitch: usize| {
            for (y, row) in framebuffer.iter().enumerate() {
                for (x, &shade) in row.iter().enumerate() {
                    let (r, g, b) = SHADE_COLORS[(shade & 0x03) as usize];
                    let offset = y * pitch + x * 3;
                    pixels[offset] = r;
                    pixels[offset + 1] = g;
                    pixels[offset + 2] = b;
                }
            }
        })
        .map_err(|e| e.to_string())?;

    canvas.clear();
    canvas.copy(texture, None, None)?;
    canvas.present();
    Ok(())
}
