use bevy::math::Vec3;

/// Coordinate transformation matrix (row-major: [x_new, y_new, z_new])
/// Maps RAS millimetre space (X right, Y anterior, Z superior) onto the
/// right-handed Y-up display frame that glTF anatomy is authored in.
pub const RAS_TO_DISPLAY: [[f32; 3]; 3] = [
    [1.0, 0.0, 0.0],  // X = R
    [0.0, 0.0, 1.0],  // Y = S
    [0.0, -1.0, 0.0], // Z = -A
];

/// Half extent of the normalized authoring cube.
pub const NORMALIZED_HALF_EXTENT: f32 = 0.5;

/// Slack allowed when validating normalized authoring coordinates.
pub const NORMALIZED_TOLERANCE: f32 = 1.0e-3;

/// Apply coordinate transformation matrix to an authored RAS point.
pub fn ras_to_display(point: [f32; 3]) -> Vec3 {
    let mut output = [0.0; 3];

    for i in 0..3 {
        for j in 0..3 {
            output[i] += RAS_TO_DISPLAY[i][j] * point[j];
        }
    }

    Vec3::from_array(output)
}
