//! Embedded Control Page
//!
//! Static assets served by the router so the rover is drivable from a bare
//! browser. The page speaks the same wire protocol as a native pilot:
//! comma-delimited frames over `/ws`, `/stop` when a drag ends, and the
//! camera stream re-attached on every socket open.

/// Landing page: stream view, joystick pad, gear readout.
pub(crate) const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Tank-Cam Rover</title>
  <style>
    body { margin: 0; background: #111; color: #eee; font-family: monospace; text-align: center; }
    #stream { width: 100%; max-width: 640px; margin-top: 8px; background: #000; }
    #joystick { touch-action: none; margin-top: 12px; }
    #readout { margin-top: 8px; color: #888; }
  </style>
</head>
<body>
  <img id="stream" alt="camera">
  <div><canvas id="joystick" width="240" height="240"></canvas></div>
  <div id="readout"><span id="gear">gear 4</span> <span id="stick">x 0.00 y 0.00</span></div>
  <script src="/utils.js"></script>
  <script src="/index.js"></script>
</body>
</html>
"##;

/// Drive client: socket lifecycle, tank mix, gamepad polling.
pub(crate) const INDEX_JS: &str = r##"// Drive client. Mixes the stick into per-track PWM magnitudes and streams
// them to the rover; the vehicle applies whatever arrives.

const MINIMUM_THRESHOLD = 140;
const SEND_INTERVAL = 100;
const RECONNECT_DELAY = 200;
const GEAR_DEBOUNCE = 500;

const session = Math.random().toString(36).slice(2, 10);
let ws = null;
let reconnectTimer = null;
let lastSent = 0;
let gear = 4;
let lastGearChanged = 0;

function connectWebSocket() {
  if (ws && (ws.readyState === WebSocket.CONNECTING || ws.readyState === WebSocket.OPEN)) return;
  ws = new WebSocket(`ws://${location.host}/ws?session=${session}`, 'drive');
  ws.onopen = () => {
    if (reconnectTimer) { clearTimeout(reconnectTimer); reconnectTimer = null; }
    attachStream();
  };
  ws.onmessage = (e) => console.log('rover:', e.data);
  ws.onclose = scheduleReconnect;
  ws.onerror = () => ws.close();
}

function scheduleReconnect() {
  if (reconnectTimer) return;
  reconnectTimer = setTimeout(() => {
    reconnectTimer = null;
    connectWebSocket();
  }, RECONNECT_DELAY);
}

function attachStream() {
  document.getElementById('stream').src = `http://${location.hostname}:81/stream`;
}

function calculateTankSteering(x, y) {
  const leftMotor = Math.max(-1, Math.min(1, y + x));
  const rightMotor = Math.max(-1, Math.min(1, y - x));

  let leftForward = 0, leftBackward = 0, rightForward = 0, rightBackward = 0;
  if (leftMotor > 0) {
    leftForward = MINIMUM_THRESHOLD + Math.floor(leftMotor * (255 - MINIMUM_THRESHOLD));
  } else {
    leftBackward = MINIMUM_THRESHOLD + Math.floor(-leftMotor * (255 - MINIMUM_THRESHOLD));
  }
  if (rightMotor > 0) {
    rightForward = MINIMUM_THRESHOLD + Math.floor(rightMotor * (255 - MINIMUM_THRESHOLD));
  } else {
    rightBackward = MINIMUM_THRESHOLD + Math.floor(-rightMotor * (255 - MINIMUM_THRESHOLD));
  }

  // The H-bridge pairs are cross-wired on this chassis.
  return {
    leftForward: rightForward,
    leftBackward: rightBackward,
    rightForward: leftForward,
    rightBackward: leftBackward,
  };
}

function move(values) {
  updateDisplay(values);
  const timestamp = Date.now();
  if (timestamp - lastSent < SEND_INTERVAL) return;
  lastSent = timestamp;

  const x = (values.x * gear) / 4;
  const y = (values.y * gear) / 4;
  const motors = calculateTankSteering(x, y);

  for (const k of Object.keys(motors)) {
    if (motors[k] <= MINIMUM_THRESHOLD) motors[k] = 0;
  }

  const led = Math.floor((values.led ?? 0) * 255);
  const message = `${timestamp},${motors.leftForward},${motors.leftBackward},${motors.rightForward},${motors.rightBackward},${led}`;
  if (ws && ws.readyState === WebSocket.OPEN) ws.send(message);
}

function stopVehicle() {
  fetch('/stop');
}

function updateDisplay(values) {
  document.getElementById('gear').textContent = `gear ${gear}`;
  document.getElementById('stick').textContent = `x ${values.x.toFixed(2)} y ${values.y.toFixed(2)}`;
}

// Gamepad path: poll every 50 ms, right stick drives, shoulder buttons
// shift gears, right trigger lights.
function pollGamepad() {
  const pad = navigator.getGamepads()[0];
  if (!pad) return;

  const timestamp = Date.now();
  const down = pad.buttons[4].pressed;
  const up = pad.buttons[5].pressed;
  if (!(down && up) && timestamp - lastGearChanged > GEAR_DEBOUNCE) {
    if (down && gear > 1) { gear -= 1; lastGearChanged = timestamp; }
    else if (up && gear < 4) { gear += 1; lastGearChanged = timestamp; }
  }

  move({ x: pad.axes[2], y: -pad.axes[3], led: pad.buttons[7].value });
}

window.addEventListener('load', () => {
  new Joystick(document.getElementById('joystick'), {
    onMove: move,
    onStart: move,
    onEnd: stopVehicle,
  });
  setInterval(pollGamepad, 50);
  connectWebSocket();
});
"##;

/// Canvas joystick widget.
pub(crate) const UTILS_JS: &str = r##"// Canvas joystick. Reports normalized values through the
// onStart / onMove / onEnd callbacks.
class Joystick {
  constructor(canvas, options = {}) {
    this.canvas = canvas;
    this.ctx = canvas.getContext('2d');
    this.centerX = canvas.width / 2;
    this.centerY = canvas.height / 2;
    this.maxDistance = canvas.width / 2 - 20;
    this.knobX = this.centerX;
    this.knobY = this.centerY;
    this.dragging = false;
    this.onMove = options.onMove || (() => {});
    this.onStart = options.onStart || (() => {});
    this.onEnd = options.onEnd || (() => {});

    canvas.addEventListener('pointerdown', (e) => this.start(e));
    window.addEventListener('pointermove', (e) => this.move(e));
    window.addEventListener('pointerup', (e) => this.end(e));
    this.draw();
  }

  eventPos(e) {
    const rect = this.canvas.getBoundingClientRect();
    return { x: e.clientX - rect.left, y: e.clientY - rect.top };
  }

  start(e) {
    e.preventDefault();
    this.dragging = true;
    this.update(this.eventPos(e));
    this.onStart(this.values());
  }

  move(e) {
    if (!this.dragging) return;
    e.preventDefault();
    this.update(this.eventPos(e));
    this.onMove(this.values());
  }

  end(e) {
    if (!this.dragging) return;
    this.dragging = false;
    this.knobX = this.centerX;
    this.knobY = this.centerY;
    this.draw();
    this.onEnd(this.values());
  }

  update(pos) {
    const dx = pos.x - this.centerX;
    const dy = pos.y - this.centerY;
    const distance = Math.sqrt(dx * dx + dy * dy);
    if (distance <= this.maxDistance) {
      this.knobX = pos.x;
      this.knobY = pos.y;
    } else {
      const angle = Math.atan2(dy, dx);
      this.knobX = this.centerX + Math.cos(angle) * this.maxDistance;
      this.knobY = this.centerY + Math.sin(angle) * this.maxDistance;
    }
    this.draw();
  }

  values() {
    const dx = this.knobX - this.centerX;
    const dy = this.knobY - this.centerY;
    const distance = Math.sqrt(dx * dx + dy * dy);
    return {
      x: Math.round((dx / this.maxDistance) * 100) / 100,
      y: Math.round((-dy / this.maxDistance) * 100) / 100,
      distance: Math.round((distance / this.maxDistance) * 100) / 100,
      angle: Math.round((Math.atan2(-dy, dx) * 180 / Math.PI + 360) % 360),
      raw: { x: dx, y: dy, distance },
    };
  }

  draw() {
    const c = this.ctx;
    c.clearRect(0, 0, this.canvas.width, this.canvas.height);
    c.beginPath();
    c.arc(this.centerX, this.centerY, this.maxDistance, 0, Math.PI * 2);
    c.strokeStyle = '#555';
    c.lineWidth = 2;
    c.stroke();
    c.beginPath();
    c.arc(this.knobX, this.knobY, 18, 0, Math.PI * 2);
    c.fillStyle = '#09f';
    c.fill();
  }
}
"##;
