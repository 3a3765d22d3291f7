// Tests for the parameter store as seen through the Minuit facade
mod parameter_tests;

// Tests for keyword-style construction
mod fitarg_tests;
