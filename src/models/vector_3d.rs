use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use crate::models::{FromCoordinates, ToCoordinates};

/// A three-component vector with value semantics.
///
/// Every arithmetic operation returns a new vector; [`Vector3D::set`] and
/// [`Vector3D::set_scalar`] are the only in-place mutators besides the
/// compound assignment operators.
///
/// # Example
/// ```
/// use rs_verlet::models::Vector3D;
///
/// let a = Vector3D::new(1.0, 2.0, 3.0);
/// let b = Vector3D::new(4.0, 5.0, 6.0);
///
/// assert_eq!(a + b, Vector3D::new(5.0, 7.0, 9.0));
/// assert_eq!(a.dot(&b), 32.0);
/// assert_eq!(a.cross(&b), Vector3D::new(-3.0, 6.0, -3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub const ZERO: Vector3D = Vector3D { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D { x, y, z }
    }

    pub const fn splat(value: f64) -> Self {
        Vector3D { x: value, y: value, z: value }
    }

    /// Subtracts `scalar` from every component.
    pub fn sub_scalar(&self, scalar: f64) -> Vector3D {
        Vector3D::new(self.x - scalar, self.y - scalar, self.z - scalar)
    }

    pub fn dot(&self, other: &Vector3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3D) -> Vector3D {
        Vector3D::new(
            self.y * other.z - other.y * self.z,
            -(self.x * other.z - other.x * self.z),
            self.x * other.y - other.x * self.y,
        )
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn distance(&self, other: &Vector3D) -> f64 {
        (*self - *other).length()
    }

    pub fn distance_squared(&self, other: &Vector3D) -> f64 {
        (*self - *other).length_squared()
    }

    /// Returns the unit vector pointing the same way, or `None` for the zero vector.
    ///
    /// # Example
    /// ```
    /// use rs_verlet::models::Vector3D;
    ///
    /// let unit = Vector3D::new(3.0, 0.0, 4.0).normalize().unwrap();
    /// assert!((unit.length() - 1.0).abs() < 1e-12);
    /// assert!(Vector3D::ZERO.normalize().is_none());
    /// ```
    pub fn normalize(&self) -> Option<Vector3D> {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        Some(*self / length)
    }

    /// Scales the vector down to `max_length` if it is longer, otherwise returns a copy.
    ///
    /// # Example
    /// ```
    /// use rs_verlet::models::Vector3D;
    ///
    /// let clamped = Vector3D::new(0.0, 10.0, 0.0).clamp_length(2.0);
    /// assert_eq!(clamped, Vector3D::new(0.0, 2.0, 0.0));
    /// assert_eq!(Vector3D::new(1.0, 0.0, 0.0).clamp_length(2.0), Vector3D::new(1.0, 0.0, 0.0));
    /// ```
    pub fn clamp_length(&self, max_length: f64) -> Vector3D {
        let length = self.length();
        if length > max_length {
            return *self / length * max_length;
        }
        *self
    }

    pub fn set(&mut self, other: Vector3D) {
        *self = other;
    }

    pub fn set_scalar(&mut self, scalar: f64) {
        *self = Vector3D::splat(scalar);
    }

    /// Component along `axis` (0 = x, 1 = y, 2 = z).
    pub fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn axis_mut(&mut self, axis: usize) -> &mut f64 {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => &mut self.z,
        }
    }

    /// Unit vector along `axis` with the given sign.
    pub fn unit_axis(axis: usize, sign: f64) -> Vector3D {
        let mut unit = Vector3D::ZERO;
        *unit.axis_mut(axis) = sign;
        unit
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3D {
    type Output = Vector3D;

    fn add(self, other: Vector3D) -> Vector3D {
        Vector3D::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3D {
    type Output = Vector3D;

    fn sub(self, other: Vector3D) -> Vector3D {
        Vector3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Vector3D;

    fn mul(self, scalar: f64) -> Vector3D {
        Vector3D::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Div<f64> for Vector3D {
    type Output = Vector3D;

    fn div(self, scalar: f64) -> Vector3D {
        Vector3D::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;

    fn neg(self) -> Vector3D {
        Vector3D::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Vector3D {
    fn add_assign(&mut self, other: Vector3D) {
        *self = *self + other;
    }
}

impl SubAssign for Vector3D {
    fn sub_assign(&mut self, other: Vector3D) {
        *self = *self - other;
    }
}

impl FromCoordinates<(f64, f64, f64)> for Vector3D {
    fn from_coord(position: (f64, f64, f64)) -> Self {
        Vector3D {
            x: position.0,
            y: position.1,
            z: position.2,
        }
    }
}

impl ToCoordinates<(f64, f64, f64)> for Vector3D {
    fn to_coord(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl fmt::Display for Vector3D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
