// HESSE covariance tests
mod hesse_tests;

// MINOS interval tests
mod minos_tests;

// Profiled contours and plain scans
mod contour_tests;
