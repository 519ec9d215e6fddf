//! Gauss-Legendre quadrature on the reference segment and reference square.
use crate::Real;
use nalgebra::{Point1, Point2};

pub type QuadraturePair<T, P> = (Vec<T>, Vec<P>);
pub type QuadraturePair1d<T> = QuadraturePair<T, Point1<T>>;
pub type QuadraturePair2d<T> = QuadraturePair<T, Point2<T>>;

/// Tabulated Gauss-Legendre points and weights on $[-1, 1]$.
const GAUSS_LEGENDRE: [&[(f64, f64)]; 5] = [
    &[(0.0, 2.0)],
    &[(-0.5773502691896257645, 1.0), (0.5773502691896257645, 1.0)],
    &[
        (-0.7745966692414833770, 0.5555555555555555556),
        (0.0, 0.8888888888888888889),
        (0.7745966692414833770, 0.5555555555555555556),
    ],
    &[
        (-0.8611363115940525752, 0.3478548451374538574),
        (-0.3399810435848562648, 0.6521451548625461426),
        (0.3399810435848562648, 0.6521451548625461426),
        (0.8611363115940525752, 0.3478548451374538574),
    ],
    &[
        (-0.9061798459386639928, 0.2369268850561890875),
        (-0.5384693101056830910, 0.4786286704993664680),
        (0.0, 0.5688888888888888889),
        (0.5384693101056830910, 0.4786286704993664680),
        (0.9061798459386639928, 0.2369268850561890875),
    ],
];

/// The largest number of points per dimension for which Gauss-Legendre rules are available.
pub const MAX_GAUSS_POINTS: usize = GAUSS_LEGENDRE.len();

/// Returns the Gauss-Legendre rule with `num_points` points on $[-1, 1]$.
///
/// The rule integrates polynomials of degree up to `2 * num_points - 1` exactly.
///
/// # Panics
///
/// Panics if `num_points` is zero or larger than [`MAX_GAUSS_POINTS`].
pub fn gauss<T: Real>(num_points: usize) -> QuadraturePair1d<T> {
    assert!(
        num_points >= 1 && num_points <= MAX_GAUSS_POINTS,
        "Gauss-Legendre rules are available for 1 to {} points",
        MAX_GAUSS_POINTS
    );
    let convert = |x: f64| T::from_f64(x).expect("Literal must fit in T");
    GAUSS_LEGENDRE[num_points - 1]
        .iter()
        .map(|&(x, w)| (convert(w), Point1::new(convert(x))))
        .unzip()
}

/// Returns the tensor-product Gauss-Legendre rule with `points_per_dim` points in each direction
/// on the reference square $[-1, 1]^2$.
pub fn quadrilateral_gauss<T: Real>(points_per_dim: usize) -> QuadraturePair2d<T> {
    let (weights_1d, points_1d) = gauss::<T>(points_per_dim);
    let mut weights = Vec::with_capacity(points_per_dim * points_per_dim);
    let mut points = Vec::with_capacity(points_per_dim * points_per_dim);
    for (w_j, y_j) in weights_1d.iter().zip(&points_1d) {
        for (w_i, x_i) in weights_1d.iter().zip(&points_1d) {
            weights.push(*w_i * *w_j);
            points.push(Point2::new(x_i[0], y_j[0]));
        }
    }
    (weights, points)
}
