use sat_physics::*;

fn main() -> Result<(), PhysicsError> {
    let mut world = PhysicsWorld::new(1.0 / 60.0);
    world.set_parallel_enabled(true);

    world.add_plane_collider(Vec3::ZERO, Vec3::Y)?;

    let mut stack = Vec::new();
    for i in 0..5 {
        let position = Vec3::new(0.0, i as f32 * 1.05 + 0.6, 0.0);
        let handle = world.add_box_collider(position, Vec3::ONE, 1.0, 0.1, false)?;
        stack.push(handle);
    }
    world.add_sphere_collider(Vec3::new(0.2, 8.0, 0.1), 0.4, 0.5, 0.6, false)?;

    for frame in 0..120 {
        world.step(1.0 / 60.0);
        if frame % 30 == 29 {
            println!(
                "t = {:.2}s, {} contacting pairs",
                (frame + 1) as f32 / 60.0,
                world.collision_count()
            );
        }
    }

    for snapshot in world.snapshots() {
        println!(
            "{:?} {:?} at {:.3?} moving {:.3?}",
            snapshot.handle.index(),
            snapshot.shape,
            snapshot.position,
            snapshot.linear_velocity
        );
    }
    println!("Simulated stack of {} boxes for 2 seconds", stack.len());
    Ok(())
}
