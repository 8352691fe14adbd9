pub trait FromCoordinates <T> {
    /// Creates a new instance of the struct from the given coordinates.
    /// # Arguments
    /// * `position` - The coordinates to create the struct from.
    /// # Returns
    /// A new instance of the struct.
    /// # Example
    /// ```
    /// use rs_verlet::models::{FromCoordinates, Vector3D};
    ///
    /// let vector = Vector3D::from_coord((1.0, 2.0, 3.0));
    /// assert_eq!(vector.x, 1.0);
    /// assert_eq!(vector.y, 2.0);
    /// assert_eq!(vector.z, 3.0);
    /// ```
    fn from_coord(position: T) -> Self;
}

pub trait ToCoordinates <T> {
    /// Converts the struct to a tuple of coordinates.
    /// # Returns
    /// A tuple of coordinates.
    /// # Example
    /// ```
    /// use rs_verlet::models::{ToCoordinates, Vector3D};
    ///
    /// let vector = Vector3D::new(1.0, 2.0, 3.0);
    /// let coordinates = vector.to_coord();
    ///
    /// assert_eq!(coordinates, (1.0, 2.0, 3.0));
    /// ```
    fn to_coord(&self) -> T;
}
