mod action_tests;
mod relay_tests;
