// Least-squares fit of a peak to tabulated data
mod curve_fit;

// One-sided limits and inconsistent limits
mod limits;
