use tessera::wgpu_device::{BASIC_FRAGMENT_WGSL, BASIC_VERTEX_WGSL};
use tessera::{AppConfig, FrameTime, Mesh, Node, Quat, Scene, Vec3};

fn main() {
    let config = AppConfig::new().title("Tessera").size(1024, 768);

    let result = tessera::run_with_config(config, |engine| {
        engine.scene_mut().background_color = [0.3, 0.3, 0.3, 1.0];

        let program = engine.compile_program(BASIC_VERTEX_WGSL, BASIC_FRAGMENT_WGSL)?;
        let body = engine.add_mesh(Mesh::cuboid(0.5, 0.3, 0.4, 4, 3, 4).with_wireframe(true));
        let moon = engine.add_mesh(Mesh::cuboid(0.1, 0.1, 0.1, 1, 1, 1));

        let parent = engine.add(
            Node::renderable(body, program)
                .with_position(Vec3::new(0.0, 0.0, -1.0))
                .on_update(|node, time| {
                    node.set_rotation(Quat::from_euler(
                        glam::EulerRot::YXZ,
                        time.time * 0.7,
                        time.time * 0.3,
                        0.0,
                    ));
                }),
        );

        engine.scene_mut().add_child(
            parent,
            Node::renderable(moon, program)
                .with_position(Vec3::new(0.6, 0.0, 0.0))
                .on_update(|node, time| {
                    node.set_rotation(Quat::from_rotation_z(time.time * 2.0));
                }),
        )?;

        let mut elapsed = 0.0;
        let mut frames = 0u32;
        Ok(move |_scene: &mut Scene, time: &FrameTime| {
            elapsed += time.dt;
            frames += 1;
            if elapsed >= 5.0 {
                log::info!("{:.0} fps", frames as f32 / elapsed);
                elapsed = 0.0;
                frames = 0;
            }
        })
    });

    if let Err(e) = result {
        eprintln!("tessera: {e}");
        std::process::exit(1);
    }
}
