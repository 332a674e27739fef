mod health_tests;
mod websocket_tests;
